//! Domain Layer - Core Entity Trait
//!
//! Basic contract for all domain entities, owner identity and the error
//! taxonomy shared by every layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Identity of the user that exclusively controls a bean, brew, tag or
/// settings document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u32);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {}", self.0)
    }
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Step of a cascading bean delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage", content = "id")]
pub enum CascadeStage {
    /// Unlinking the tags of a dependent brew
    BrewTags(u32),
    /// Deleting a dependent brew row
    Brew(u32),
    /// Unlinking the bean's own tags
    BeanTags(u32),
    /// Deleting the bean row
    Bean(u32),
}

impl fmt::Display for CascadeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeStage::BrewTags(id) => write!(f, "tags of brew {}", id),
            CascadeStage::Brew(id) => write!(f, "brew {}", id),
            CascadeStage::BeanTags(id) => write!(f, "tags of bean {}", id),
            CascadeStage::Bean(id) => write!(f, "bean {}", id),
        }
    }
}

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Malformed rule, tag id set or other input, rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource missing for the requesting owner (also used for other
    /// owners' resources)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying store read/write failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A cascading delete stopped at `stage`
    #[error("Cascade delete aborted at {stage}: {source}")]
    Cascade {
        stage: CascadeStage,
        #[source]
        source: Box<DomainError>,
    },
}

impl DomainError {
    /// Wrap an error as the failure of one cascade step
    pub fn at_stage(self, stage: CascadeStage) -> Self {
        DomainError::Cascade {
            stage,
            source: Box::new(self),
        }
    }

    /// The cascade step that failed, if this is a cascade error
    pub fn cascade_stage(&self) -> Option<CascadeStage> {
        match self {
            DomainError::Cascade { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
