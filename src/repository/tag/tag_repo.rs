//! Tag Repository - Core CRUD Operations
//!
//! SQLite-backed implementation of TagStore.
//! Resource-tag links live in `resource_tag`.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeSet;

use crate::domain::{normalize_tag_name, DomainError, DomainResult, OwnerId, Tag};
use super::super::db::{db_err, inserted_id, not_initialized, SharedConnection};
use super::super::traits::TagStore;

/// SQLite implementation of Tag repository
pub struct TagRepository {
    pub(super) conn: SharedConnection,
}

impl TagRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl TagStore for TagRepository {
    async fn create_tag(&self, owner: OwnerId, name: &str) -> DomainResult<Tag> {
        let name = normalize_tag_name(name)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.execute(
            "INSERT INTO tags (user_id, name) VALUES (?1, ?2)",
            params![owner.0, name],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::Validation(format!("tag '{}' already exists", name))
            } else {
                db_err(e)
            }
        })?;

        let id = inserted_id(conn)?;
        log::debug!("Created tag {} '{}' for {}", id, name, owner);
        Ok(Tag::with_id(id, &name))
    }

    async fn find_tag(&self, owner: OwnerId, id: u32) -> DomainResult<Option<Tag>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.query_row(
            "SELECT id, name FROM tags WHERE id = ?1 AND user_id = ?2",
            params![id, owner.0],
            row_to_tag,
        )
        .optional()
        .map_err(db_err)
    }

    async fn find_tag_by_name(&self, owner: OwnerId, name: &str) -> DomainResult<Option<Tag>> {
        let name = normalize_tag_name(name)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.query_row(
            "SELECT id, name FROM tags WHERE name = ?1 AND user_id = ?2",
            params![name, owner.0],
            row_to_tag,
        )
        .optional()
        .map_err(db_err)
    }

    async fn list_tags(&self, owner: OwnerId) -> DomainResult<Vec<Tag>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare("SELECT id, name FROM tags WHERE user_id = ?1 ORDER BY name")
            .map_err(db_err)?;
        let rows = stmt.query_map(params![owner.0], row_to_tag).map_err(db_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    async fn rename_tag(&self, owner: OwnerId, id: u32, name: &str) -> DomainResult<Tag> {
        let name = normalize_tag_name(name)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE tags SET name = ?1 WHERE id = ?2 AND user_id = ?3",
                params![name, id, owner.0],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::Validation(format!("tag '{}' already exists", name))
                } else {
                    db_err(e)
                }
            })?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("tag {}", id)));
        }
        Ok(Tag::with_id(id, &name))
    }

    async fn delete_tag(&self, owner: OwnerId, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        // Links go with the tag (ON DELETE CASCADE)
        let changed = conn
            .execute("DELETE FROM tags WHERE id = ?1 AND user_id = ?2", params![id, owner.0])
            .map_err(db_err)?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("tag {}", id)));
        }
        log::debug!("Deleted tag {} of {}", id, owner);
        Ok(())
    }

    async fn owned_tag_ids(&self, owner: OwnerId, ids: &BTreeSet<u32>) -> DomainResult<BTreeSet<u32>> {
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare("SELECT 1 FROM tags WHERE id = ?1 AND user_id = ?2")
            .map_err(db_err)?;

        let mut owned = BTreeSet::new();
        for &id in ids {
            if stmt.exists(params![id, owner.0]).map_err(db_err)? {
                owned.insert(id);
            }
        }
        Ok(owned)
    }
}

/// Convert a database row to Tag
pub(super) fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: Some(row.get(0)?),
        name: row.get(1)?,
    })
}
