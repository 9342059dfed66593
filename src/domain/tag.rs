//! Tag Entity
//!
//! Tags can be attached to beans and brews for categorization and filtering.

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult};

/// Longest allowed tag name, in characters
pub const MAX_TAG_NAME_LEN: usize = 64;

/// A tag. `id` is `None` until the tag has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<u32>,
    pub name: String,
}

impl Tag {
    /// A tag that has not been stored yet
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }

    pub fn with_id(id: u32, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Trim a tag name and check it is usable
pub fn normalize_tag_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation("tag name cannot be empty".into()));
    }
    if trimmed.chars().count() > MAX_TAG_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "tag name longer than {} characters",
            MAX_TAG_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}
