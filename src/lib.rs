//! Brew Log Backend
//!
//! Layered architecture:
//! - domain: Core entities, option generation and tag reconciliation
//! - repository: Data access abstractions and SQLite implementations
//! - commands: Operations exposed to the UI / HTTP layer
//! - store: Caller-side state with optimistic commits

use std::sync::Arc;
use thiserror::Error;

pub mod commands;
pub mod config;
pub mod domain;
pub mod repository;
pub mod store;

use config::{AppConfig, ConfigError};
use domain::{Bean, DomainError};
use repository::{
    init_db, BeanRepository, BrewRepository, BrewsByBean, DbState, Repository, SettingsRepository,
    SettingsStore, TagLinkOperations, TagRepository, TagStore,
};

/// Errors raised while bringing the application up
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Logger error: {0}")]
    Logger(#[from] rolling_logger::LoggerError),

    #[error(transparent)]
    Database(#[from] DomainError),
}

/// Application state shared across commands
#[derive(Clone)]
pub struct AppState {
    pub db_state: DbState,
    pub beans: Arc<dyn Repository<Bean>>,
    pub brews: Arc<dyn BrewsByBean>,
    pub tags: Arc<dyn TagStore>,
    pub tag_links: Arc<dyn TagLinkOperations>,
    pub settings: Arc<dyn SettingsStore>,
}

impl AppState {
    /// Wire the SQLite repositories onto an initialized database
    pub fn from_db(db_state: DbState) -> Self {
        let conn = db_state.conn.clone();
        let tag_repo = Arc::new(TagRepository::new(conn.clone()));
        Self {
            beans: Arc::new(BeanRepository::new(conn.clone())),
            brews: Arc::new(BrewRepository::new(conn.clone())),
            tags: tag_repo.clone(),
            tag_links: tag_repo,
            settings: Arc::new(SettingsRepository::new(conn)),
            db_state,
        }
    }

    /// Replace the tag link store (e.g. with an instrumented one)
    pub fn with_tag_links(mut self, tag_links: Arc<dyn TagLinkOperations>) -> Self {
        self.tag_links = tag_links;
        self
    }

    /// Bring the application up: file logging (if configured), then the database
    pub async fn open(config: &AppConfig) -> Result<Self, StartupError> {
        if let Some(options) = config.logger_options() {
            match rolling_logger::init_logger_with(options) {
                Ok(()) | Err(rolling_logger::LoggerError::AlreadyInitialized) => {}
                Err(e) => return Err(e.into()),
            }
            if let Some(path) = rolling_logger::log_file_path() {
                log::info!("Writing logs to {}", path.display());
            }
        }

        log::info!("Opening brew log database at {}", config.db_path.display());
        match init_db(&config.db_path).await {
            Ok(db_state) => {
                let _ = rolling_logger::info("Database init success");
                Ok(Self::from_db(db_state))
            }
            Err(e) => {
                let _ = rolling_logger::error(&format!("Database init failed: {}", e));
                Err(e.into())
            }
        }
    }

    /// Load the config file, apply environment overrides and open
    pub async fn open_with_config_file(path: &std::path::Path) -> Result<Self, StartupError> {
        let mut config = AppConfig::load(path)?;
        config.apply_env_overrides();
        Self::open(&config).await
    }
}
