//! Tag Repository Module
//!
//! - tag_repo: Core CRUD operations
//! - resource_tag: Bean/brew tag links and diff application

mod resource_tag;
mod tag_repo;

pub use tag_repo::TagRepository;
pub use resource_tag::{apply_tag_diff, sync_tags};

pub(crate) use resource_tag::load_tag_ids;
