//! Repository Layer - Core Traits
//!
//! Abstract, owner-scoped interfaces for data access. Every call takes the
//! owner; rows belonging to anyone else behave as if they did not exist.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::domain::{BrewSettingOption, BrewSettings, Brew, DomainResult, Entity, OwnerId, ResourceKind, Tag};

/// Core repository trait for CRUD operations
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity for `owner`
    async fn create(&self, owner: OwnerId, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, owner: OwnerId, id: T::Id) -> DomainResult<Option<T>>;

    /// List all entities of `owner`
    async fn list(&self, owner: OwnerId) -> DomainResult<Vec<T>>;

    /// Update an existing entity; `NotFound` if the owner has no such row
    async fn update(&self, owner: OwnerId, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID; `NotFound` if the owner has no such row
    async fn delete(&self, owner: OwnerId, id: T::Id) -> DomainResult<()>;
}

/// Brew lookups by parent bean
#[async_trait]
pub trait BrewsByBean: Repository<Brew> {
    /// Brews of one bean, ordered by id
    async fn list_for_bean(&self, owner: OwnerId, bean_id: u32) -> DomainResult<Vec<Brew>>;
}

/// Tag storage
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn create_tag(&self, owner: OwnerId, name: &str) -> DomainResult<Tag>;

    async fn find_tag(&self, owner: OwnerId, id: u32) -> DomainResult<Option<Tag>>;

    async fn find_tag_by_name(&self, owner: OwnerId, name: &str) -> DomainResult<Option<Tag>>;

    /// All tags of `owner`, sorted by name
    async fn list_tags(&self, owner: OwnerId) -> DomainResult<Vec<Tag>>;

    async fn rename_tag(&self, owner: OwnerId, id: u32, name: &str) -> DomainResult<Tag>;

    /// Delete a tag together with all of its associations
    async fn delete_tag(&self, owner: OwnerId, id: u32) -> DomainResult<()>;

    /// The subset of `ids` that exist and belong to `owner`
    async fn owned_tag_ids(&self, owner: OwnerId, ids: &BTreeSet<u32>) -> DomainResult<BTreeSet<u32>>;
}

/// Resource-tag association operations
#[async_trait]
pub trait TagLinkOperations: Send + Sync {
    /// Tag ids currently linked to a resource
    async fn linked_tag_ids(&self, owner: OwnerId, kind: ResourceKind, resource_id: u32) -> DomainResult<BTreeSet<u32>>;

    /// Link a tag to a resource if not already linked
    async fn link_tag(&self, owner: OwnerId, kind: ResourceKind, resource_id: u32, tag_id: u32) -> DomainResult<()>;

    /// Remove a link
    async fn unlink_tag(&self, owner: OwnerId, kind: ResourceKind, resource_id: u32, tag_id: u32) -> DomainResult<()>;

    /// Remove every link of a resource, returning how many were removed
    async fn unlink_all(&self, owner: OwnerId, kind: ResourceKind, resource_id: u32) -> DomainResult<usize>;
}

/// Per-owner settings documents
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Stored entries in stored order, or `None` if the owner has no document
    async fn load_settings(&self, owner: OwnerId) -> DomainResult<Option<Vec<BrewSettingOption>>>;

    async fn save_settings(&self, owner: OwnerId, settings: &BrewSettings) -> DomainResult<()>;

    /// Remove the owner's document; returns whether one existed
    async fn delete_settings(&self, owner: OwnerId) -> DomainResult<bool>;
}
