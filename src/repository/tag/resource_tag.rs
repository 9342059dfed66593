//! Resource-Tag Relationship Operations
//!
//! Manages the many-to-many links between beans/brews and tags, and applies
//! reconciliation diffs against them.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;

use crate::domain::{
    reconcile_tags, DomainError, DomainResult, OwnerId, ResourceKind, TagDiff, TagLinkOp,
};
use super::super::db::{db_err, not_initialized};
use super::super::traits::TagLinkOperations;
use super::tag_repo::TagRepository;

/// Tag ids linked to a resource, sorted
pub(crate) fn load_tag_ids(
    conn: &Connection,
    owner: OwnerId,
    kind: ResourceKind,
    resource_id: u32,
) -> DomainResult<Vec<u32>> {
    let sql = format!(
        "SELECT tag_id FROM {} WHERE {} = ?1 AND user_id = ?2 ORDER BY tag_id",
        kind.link_table(),
        kind.link_column()
    );
    let mut stmt = conn.prepare(&sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params![resource_id, owner.0], |row| row.get::<_, u32>(0))
        .map_err(db_err)?;

    let ids = rows.collect::<Result<Vec<_>, _>>().map_err(db_err)?;
    Ok(ids)
}

#[async_trait]
impl TagLinkOperations for TagRepository {
    async fn linked_tag_ids(&self, owner: OwnerId, kind: ResourceKind, resource_id: u32) -> DomainResult<BTreeSet<u32>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        Ok(load_tag_ids(conn, owner, kind, resource_id)?.into_iter().collect())
    }

    async fn link_tag(&self, owner: OwnerId, kind: ResourceKind, resource_id: u32, tag_id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        // Resource and tag must both belong to the owner
        let sql = format!(
            "INSERT OR IGNORE INTO {table} ({column}, tag_id, user_id)
             SELECT r.id, t.id, r.user_id FROM {resources} r
             JOIN tags t ON t.user_id = r.user_id
             WHERE r.id = ?1 AND t.id = ?2 AND r.user_id = ?3",
            table = kind.link_table(),
            column = kind.link_column(),
            resources = kind.table(),
        );
        let inserted = conn
            .execute(&sql, params![resource_id, tag_id, owner.0])
            .map_err(db_err)?;

        if inserted == 0 {
            let exists_sql = format!(
                "SELECT 1 FROM {} WHERE {} = ?1 AND tag_id = ?2 AND user_id = ?3",
                kind.link_table(),
                kind.link_column()
            );
            let exists = conn
                .prepare(&exists_sql)
                .and_then(|mut stmt| stmt.exists(params![resource_id, tag_id, owner.0]))
                .map_err(db_err)?;
            if !exists {
                return Err(DomainError::NotFound(format!(
                    "tag {} or {} {}",
                    tag_id, kind, resource_id
                )));
            }
        }
        Ok(())
    }

    async fn unlink_tag(&self, owner: OwnerId, kind: ResourceKind, resource_id: u32, tag_id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1 AND tag_id = ?2 AND user_id = ?3",
            kind.link_table(),
            kind.link_column()
        );
        conn.execute(&sql, params![resource_id, tag_id, owner.0])
            .map_err(db_err)?;
        Ok(())
    }

    async fn unlink_all(&self, owner: OwnerId, kind: ResourceKind, resource_id: u32) -> DomainResult<usize> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1 AND user_id = ?2",
            kind.link_table(),
            kind.link_column()
        );
        conn.execute(&sql, params![resource_id, owner.0]).map_err(db_err)
    }
}

/// Apply a diff operation by operation, stopping at the first failure
pub async fn apply_tag_diff(store: &dyn TagLinkOperations, diff: &TagDiff) -> DomainResult<()> {
    for op in diff.operations() {
        match op {
            TagLinkOp::Link { owner, kind, resource_id, tag_id } => {
                store.link_tag(owner, kind, resource_id, tag_id).await?
            }
            TagLinkOp::Unlink { owner, kind, resource_id, tag_id } => {
                store.unlink_tag(owner, kind, resource_id, tag_id).await?
            }
        }
    }
    Ok(())
}

/// Read the current links of a resource, reconcile them with `desired` and
/// apply the difference. Returns the applied diff.
pub async fn sync_tags(
    store: &dyn TagLinkOperations,
    owner: OwnerId,
    kind: ResourceKind,
    resource_id: u32,
    desired: &BTreeSet<u32>,
) -> DomainResult<TagDiff> {
    let current = store.linked_tag_ids(owner, kind, resource_id).await?;
    let diff = reconcile_tags(owner, resource_id, kind, desired, &current);

    if !diff.is_empty() {
        log::debug!(
            "Reconciling tags of {} {} for {}: +{:?} -{:?}",
            kind,
            resource_id,
            owner,
            diff.to_add,
            diff.to_remove
        );
        apply_tag_diff(store, &diff).await?;
    }
    Ok(diff)
}
