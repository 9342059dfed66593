//! Brew Repository Implementation
//!
//! SQLite-backed implementation of Repository<Brew> and BrewsByBean

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Params};

use crate::domain::{Brew, DomainError, DomainResult, OwnerId, Pour, ResourceKind, TasteRatings};
use super::db::{db_err, inserted_id, not_initialized, SharedConnection};
use super::tag::load_tag_ids;
use super::traits::{BrewsByBean, Repository};

const BREW_COLUMNS: &str = "id, user_id, bean_id, cups, bean_amount, water_amount, grind_size, water_temperature,
    brew_time, pours, acidity, sweetness, bitterness, body, rating, notes, brewed_at, updated_at";

/// SQLite implementation of Brew repository
pub struct BrewRepository {
    conn: SharedConnection,
}

impl BrewRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

fn pours_json(pours: &[Pour]) -> DomainResult<String> {
    serde_json::to_string(pours).map_err(|e| DomainError::Persistence(format!("Failed to encode pours: {}", e)))
}

fn query_brews<P: Params>(conn: &Connection, sql: &str, owner: OwnerId, args: P) -> DomainResult<Vec<Brew>> {
    let mut stmt = conn.prepare(sql).map_err(db_err)?;
    let rows = stmt.query_map(args, row_to_brew).map_err(db_err)?;

    let mut brews = Vec::new();
    for row in rows {
        let mut brew = row.map_err(db_err)?;
        brew.tag_ids = load_tag_ids(conn, owner, ResourceKind::Brew, brew.id)?;
        brews.push(brew);
    }
    Ok(brews)
}

#[async_trait]
impl Repository<Brew> for BrewRepository {
    async fn create(&self, owner: OwnerId, entity: &Brew) -> DomainResult<Brew> {
        let pours = pours_json(&entity.pours)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = chrono::Utc::now().timestamp_millis();
        // Only insert when the bean belongs to the same owner
        let inserted = conn
            .execute(
                "INSERT INTO brews (user_id, bean_id, cups, bean_amount, water_amount, grind_size, water_temperature,
                    brew_time, pours, acidity, sweetness, bitterness, body, rating, notes, brewed_at, updated_at)
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17
                 WHERE EXISTS (SELECT 1 FROM beans WHERE id = ?2 AND user_id = ?1)",
                params![
                    owner.0,
                    entity.bean_id,
                    entity.cups,
                    entity.bean_amount,
                    entity.water_amount,
                    entity.grind_size,
                    entity.water_temperature,
                    entity.brew_time,
                    pours,
                    entity.taste.acidity,
                    entity.taste.sweetness,
                    entity.taste.bitterness,
                    entity.taste.body,
                    entity.taste.rating,
                    entity.notes,
                    entity.brewed_at,
                    now
                ],
            )
            .map_err(db_err)?;

        if inserted == 0 {
            return Err(DomainError::NotFound(format!("bean {}", entity.bean_id)));
        }

        let mut brew = entity.clone();
        brew.id = inserted_id(conn)?;
        brew.owner = owner;
        brew.updated_at = Some(now);
        brew.tag_ids = Vec::new();
        log::debug!("Created brew {} of bean {} for {}", brew.id, brew.bean_id, owner);
        Ok(brew)
    }

    async fn find_by_id(&self, owner: OwnerId, id: u32) -> DomainResult<Option<Brew>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let brew = conn
            .query_row(
                &format!("SELECT {} FROM brews WHERE id = ?1 AND user_id = ?2", BREW_COLUMNS),
                params![id, owner.0],
                row_to_brew,
            )
            .optional()
            .map_err(db_err)?;

        match brew {
            Some(mut brew) => {
                brew.tag_ids = load_tag_ids(conn, owner, ResourceKind::Brew, brew.id)?;
                Ok(Some(brew))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, owner: OwnerId) -> DomainResult<Vec<Brew>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        query_brews(
            conn,
            &format!(
                "SELECT {} FROM brews WHERE user_id = ?1 ORDER BY brewed_at DESC, id DESC",
                BREW_COLUMNS
            ),
            owner,
            params![owner.0],
        )
    }

    async fn update(&self, owner: OwnerId, entity: &Brew) -> DomainResult<Brew> {
        let pours = pours_json(&entity.pours)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn
            .execute(
                "UPDATE brews SET bean_id = ?1, cups = ?2, bean_amount = ?3, water_amount = ?4, grind_size = ?5,
                    water_temperature = ?6, brew_time = ?7, pours = ?8, acidity = ?9, sweetness = ?10,
                    bitterness = ?11, body = ?12, rating = ?13, notes = ?14, brewed_at = ?15, updated_at = ?16
                 WHERE id = ?17 AND user_id = ?18
                   AND EXISTS (SELECT 1 FROM beans WHERE id = ?1 AND user_id = ?18)",
                params![
                    entity.bean_id,
                    entity.cups,
                    entity.bean_amount,
                    entity.water_amount,
                    entity.grind_size,
                    entity.water_temperature,
                    entity.brew_time,
                    pours,
                    entity.taste.acidity,
                    entity.taste.sweetness,
                    entity.taste.bitterness,
                    entity.taste.body,
                    entity.taste.rating,
                    entity.notes,
                    entity.brewed_at,
                    now,
                    entity.id,
                    owner.0
                ],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("brew {}", entity.id)));
        }

        let mut brew = entity.clone();
        brew.owner = owner;
        brew.updated_at = Some(now);
        Ok(brew)
    }

    async fn delete(&self, owner: OwnerId, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute("DELETE FROM brews WHERE id = ?1 AND user_id = ?2", params![id, owner.0])
            .map_err(db_err)?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("brew {}", id)));
        }
        log::debug!("Deleted brew {} of {}", id, owner);
        Ok(())
    }
}

#[async_trait]
impl BrewsByBean for BrewRepository {
    async fn list_for_bean(&self, owner: OwnerId, bean_id: u32) -> DomainResult<Vec<Brew>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        query_brews(
            conn,
            &format!(
                "SELECT {} FROM brews WHERE user_id = ?1 AND bean_id = ?2 ORDER BY id",
                BREW_COLUMNS
            ),
            owner,
            params![owner.0, bean_id],
        )
    }
}

/// Convert a database row to Brew (tags are loaded separately)
fn row_to_brew(row: &rusqlite::Row) -> rusqlite::Result<Brew> {
    let pours_text: String = row.get(9)?;
    let pours: Vec<Pour> = serde_json::from_str(&pours_text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

    Ok(Brew {
        id: row.get(0)?,
        owner: OwnerId(row.get(1)?),
        bean_id: row.get(2)?,
        cups: row.get(3)?,
        bean_amount: row.get(4)?,
        water_amount: row.get(5)?,
        grind_size: row.get(6)?,
        water_temperature: row.get(7)?,
        brew_time: row.get(8)?,
        pours,
        taste: TasteRatings {
            acidity: row.get(10)?,
            sweetness: row.get(11)?,
            bitterness: row.get(12)?,
            body: row.get(13)?,
            rating: row.get(14)?,
        },
        notes: row.get(15)?,
        brewed_at: row.get(16)?,
        updated_at: row.get(17)?,
        tag_ids: Vec::new(),
    })
}
