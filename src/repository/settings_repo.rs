//! Settings Repository
//!
//! One JSON document per owner holding the ordered brew settings.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::domain::{BrewSettingOption, BrewSettings, DomainError, DomainResult, OwnerId};
use super::db::{db_err, not_initialized, SharedConnection};
use super::traits::SettingsStore;

pub struct SettingsRepository {
    conn: SharedConnection,
}

impl SettingsRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn load_settings(&self, owner: OwnerId) -> DomainResult<Option<Vec<BrewSettingOption>>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let document: Option<String> = conn
            .query_row(
                "SELECT settings FROM brew_settings WHERE user_id = ?1",
                params![owner.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        match document {
            Some(json) => {
                let entries = serde_json::from_str(&json).map_err(|e| {
                    DomainError::Persistence(format!("Corrupt settings document for {}: {}", owner, e))
                })?;
                Ok(Some(entries))
            }
            None => Ok(None),
        }
    }

    async fn save_settings(&self, owner: OwnerId, settings: &BrewSettings) -> DomainResult<()> {
        let json = serde_json::to_string(settings)
            .map_err(|e| DomainError::Persistence(format!("Failed to encode settings: {}", e)))?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.execute(
            "INSERT INTO brew_settings (user_id, settings, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET settings = excluded.settings, updated_at = excluded.updated_at",
            params![owner.0, json, chrono::Utc::now().timestamp_millis()],
        )
        .map_err(db_err)?;

        log::debug!("Saved {} settings for {}", settings.len(), owner);
        Ok(())
    }

    async fn delete_settings(&self, owner: OwnerId) -> DomainResult<bool> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let removed = conn
            .execute("DELETE FROM brew_settings WHERE user_id = ?1", params![owner.0])
            .map_err(db_err)?;
        Ok(removed > 0)
    }
}
