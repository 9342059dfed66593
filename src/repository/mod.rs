//! Repository Layer
//!
//! Data access abstractions and their SQLite implementations.

mod bean_repo;
mod brew_repo;
pub mod db;
mod settings_repo;
pub mod tag;
mod traits;

#[cfg(test)]
mod tests;

pub use bean_repo::BeanRepository;
pub use brew_repo::BrewRepository;
pub use db::{init_db, init_in_memory, DbState, SharedConnection};
pub use settings_repo::SettingsRepository;
pub use tag::{apply_tag_diff, sync_tags, TagRepository};
pub use traits::{BrewsByBean, Repository, SettingsStore, TagLinkOperations, TagStore};
