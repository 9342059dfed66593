//! Bean Repository Implementation
//!
//! SQLite-backed implementation of Repository<Bean>

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::domain::{Bean, DomainError, DomainResult, OwnerId, ResourceKind, RoastLevel};
use super::db::{db_err, inserted_id, not_initialized, SharedConnection};
use super::tag::load_tag_ids;
use super::traits::Repository;

const BEAN_COLUMNS: &str =
    "id, user_id, name, roaster, origin, process, roast_level, roast_date, notes, created_at, updated_at";

/// SQLite implementation of Bean repository
pub struct BeanRepository {
    conn: SharedConnection,
}

impl BeanRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Repository<Bean> for BeanRepository {
    async fn create(&self, owner: OwnerId, entity: &Bean) -> DomainResult<Bean> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO beans (user_id, name, roaster, origin, process, roast_level, roast_date, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                owner.0,
                entity.name,
                entity.roaster,
                entity.origin,
                entity.process,
                entity.roast_level.map(|level| level.as_str()),
                entity.roast_date,
                entity.notes,
                now
            ],
        )
        .map_err(db_err)?;

        let mut bean = entity.clone();
        bean.id = inserted_id(conn)?;
        bean.owner = owner;
        bean.created_at = Some(now);
        bean.updated_at = Some(now);
        bean.tag_ids = Vec::new();
        log::debug!("Created bean {} for {}", bean.id, owner);
        Ok(bean)
    }

    async fn find_by_id(&self, owner: OwnerId, id: u32) -> DomainResult<Option<Bean>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let bean = conn
            .query_row(
                &format!("SELECT {} FROM beans WHERE id = ?1 AND user_id = ?2", BEAN_COLUMNS),
                params![id, owner.0],
                row_to_bean,
            )
            .optional()
            .map_err(db_err)?;

        match bean {
            Some(mut bean) => {
                bean.tag_ids = load_tag_ids(conn, owner, ResourceKind::Bean, bean.id)?;
                Ok(Some(bean))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, owner: OwnerId) -> DomainResult<Vec<Bean>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM beans WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
                BEAN_COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map(params![owner.0], row_to_bean).map_err(db_err)?;

        let mut beans = Vec::new();
        for row in rows {
            let mut bean = row.map_err(db_err)?;
            bean.tag_ids = load_tag_ids(conn, owner, ResourceKind::Bean, bean.id)?;
            beans.push(bean);
        }
        Ok(beans)
    }

    async fn update(&self, owner: OwnerId, entity: &Bean) -> DomainResult<Bean> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn
            .execute(
                "UPDATE beans SET name = ?1, roaster = ?2, origin = ?3, process = ?4, roast_level = ?5,
                    roast_date = ?6, notes = ?7, updated_at = ?8
                 WHERE id = ?9 AND user_id = ?10",
                params![
                    entity.name,
                    entity.roaster,
                    entity.origin,
                    entity.process,
                    entity.roast_level.map(|level| level.as_str()),
                    entity.roast_date,
                    entity.notes,
                    now,
                    entity.id,
                    owner.0
                ],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("bean {}", entity.id)));
        }

        let mut bean = entity.clone();
        bean.owner = owner;
        bean.updated_at = Some(now);
        Ok(bean)
    }

    async fn delete(&self, owner: OwnerId, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute("DELETE FROM beans WHERE id = ?1 AND user_id = ?2", params![id, owner.0])
            .map_err(db_err)?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("bean {}", id)));
        }
        log::debug!("Deleted bean {} of {}", id, owner);
        Ok(())
    }
}

/// Convert a database row to Bean (tags are loaded separately)
fn row_to_bean(row: &rusqlite::Row) -> rusqlite::Result<Bean> {
    let roast_level: Option<String> = row.get(6)?;
    Ok(Bean {
        id: row.get(0)?,
        owner: OwnerId(row.get(1)?),
        name: row.get(2)?,
        roaster: row.get(3)?,
        origin: row.get(4)?,
        process: row.get(5)?,
        roast_level: roast_level.as_deref().and_then(RoastLevel::from_str),
        roast_date: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        tag_ids: Vec::new(),
    })
}
