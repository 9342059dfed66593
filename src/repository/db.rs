//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Connection handle shared by all repositories
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: SharedConnection,
    pub path: PathBuf,
}

impl DbState {
    pub fn new(path: PathBuf) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            path,
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Drop the connection; repositories report "not initialized" afterwards
    pub async fn close(&self) {
        let mut guard = self.conn.lock().await;
        if guard.take().is_some() {
            log::info!("Closed database {}", self.path.display());
        }
    }
}

pub(crate) fn db_err(e: rusqlite::Error) -> DomainError {
    DomainError::Persistence(e.to_string())
}

pub(crate) fn not_initialized() -> DomainError {
    DomainError::Persistence("Database not initialized".to_string())
}

/// Row id of the last insert, as the u32 ids used by the domain
pub(crate) fn inserted_id(conn: &Connection) -> DomainResult<u32> {
    row_id(conn.last_insert_rowid())
}

fn row_id(rowid: i64) -> DomainResult<u32> {
    u32::try_from(rowid).map_err(|_| DomainError::Persistence(format!("row id {} is out of range", rowid)))
}

/// Open (or create) the database at `db_path` and run migrations
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::Persistence(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
    }

    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Persistence(format!("Failed to open {}: {}", db_path.display(), e)))?;
    prepare(&conn)?;

    let state = DbState::new(db_path.to_path_buf());
    *state.conn.lock().await = Some(conn);
    log::info!("Database ready at {}", db_path.display());
    Ok(state)
}

/// Private in-memory database, used by tests and previews
pub async fn init_in_memory() -> DomainResult<DbState> {
    let conn = Connection::open_in_memory().map_err(db_err)?;
    prepare(&conn)?;

    let state = DbState::new(PathBuf::from(":memory:"));
    *state.conn.lock().await = Some(conn);
    Ok(state)
}

fn prepare(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_err)?;
    run_migrations(conn)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(db_err)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(db_err)?;

    for name in names {
        if name.map_err(db_err)? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS beans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            roaster TEXT,
            origin TEXT,
            roast_level TEXT,
            roast_date TEXT,
            notes TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS brews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            bean_id INTEGER NOT NULL REFERENCES beans(id),
            cups INTEGER NOT NULL DEFAULT 1,
            bean_amount REAL,
            water_amount REAL,
            grind_size TEXT,
            water_temperature REAL,
            brew_time REAL,
            acidity INTEGER,
            sweetness INTEGER,
            bitterness INTEGER,
            body INTEGER,
            rating INTEGER,
            notes TEXT,
            brewed_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            UNIQUE (user_id, name)
        );

        CREATE TABLE IF NOT EXISTS bean_tags (
            bean_id INTEGER NOT NULL REFERENCES beans(id),
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL,
            PRIMARY KEY (bean_id, tag_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS brew_tags (
            brew_id INTEGER NOT NULL REFERENCES brews(id),
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL,
            PRIMARY KEY (brew_id, tag_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS brew_settings (
            user_id INTEGER PRIMARY KEY,
            settings TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .map_err(db_err)?;

    // Columns added after the first release
    if !column_exists(conn, "beans", "process")? {
        conn.execute("ALTER TABLE beans ADD COLUMN process TEXT", [])
            .map_err(|e| DomainError::Persistence(format!("Failed to add process: {}", e)))?;
    }

    if !column_exists(conn, "brews", "pours")? {
        conn.execute("ALTER TABLE brews ADD COLUMN pours TEXT NOT NULL DEFAULT '[]'", [])
            .map_err(|e| DomainError::Persistence(format!("Failed to add pours: {}", e)))?;
    }

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_beans_user ON beans(user_id);
        CREATE INDEX IF NOT EXISTS idx_brews_user_bean ON brews(user_id, bean_id);
        CREATE INDEX IF NOT EXISTS idx_bean_tags_tag ON bean_tags(tag_id);
        CREATE INDEX IF NOT EXISTS idx_brew_tags_tag ON brew_tags(tag_id);",
    )
    .map_err(db_err)?;

    Ok(())
}
