//! Tag Commands
//!
//! Tag CRUD and resolution of the tags submitted with a bean or brew.

use std::collections::BTreeSet;

use crate::domain::{normalize_tag_name, tag_id_set, DomainError, DomainResult, OwnerId, Tag};
use crate::AppState;

/// Create a new tag
pub async fn create_tag(state: &AppState, owner: OwnerId, name: &str) -> DomainResult<Tag> {
    state.tags.create_tag(owner, name).await
}

/// List all tags of the owner
pub async fn list_tags(state: &AppState, owner: OwnerId) -> DomainResult<Vec<Tag>> {
    state.tags.list_tags(owner).await
}

/// Get tag by ID
pub async fn get_tag(state: &AppState, owner: OwnerId, id: u32) -> DomainResult<Tag> {
    state
        .tags
        .find_tag(owner, id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("tag {}", id)))
}

/// Rename a tag
pub async fn rename_tag(state: &AppState, owner: OwnerId, id: u32, name: &str) -> DomainResult<Tag> {
    state.tags.rename_tag(owner, id, name).await
}

/// Delete a tag and detach it from every bean and brew
pub async fn delete_tag(state: &AppState, owner: OwnerId, id: u32) -> DomainResult<()> {
    state.tags.delete_tag(owner, id).await
}

/// Check that every id is a tag of `owner`
pub(crate) async fn owned_tag_set(
    state: &AppState,
    owner: OwnerId,
    ids: impl IntoIterator<Item = u32>,
) -> DomainResult<BTreeSet<u32>> {
    let ids = tag_id_set(ids)?;
    let owned = state.tags.owned_tag_ids(owner, &ids).await?;

    let missing: Vec<String> = ids.difference(&owned).map(|id| id.to_string()).collect();
    if !missing.is_empty() {
        return Err(DomainError::NotFound(format!("tags {}", missing.join(", "))));
    }
    Ok(ids)
}

/// Resolve submitted tags to ids.
///
/// Tags without an id are looked up by name and created when missing; tags
/// with an id must belong to the owner.
pub async fn ensure_tags(state: &AppState, owner: OwnerId, tags: &[Tag]) -> DomainResult<BTreeSet<u32>> {
    let mut existing = Vec::new();
    let mut new_names = Vec::new();
    for tag in tags {
        match tag.id {
            Some(id) => existing.push(id),
            None => new_names.push(normalize_tag_name(&tag.name)?),
        }
    }

    // Validate everything before the first write
    let mut ids = owned_tag_set(state, owner, existing).await?;

    for name in new_names {
        let id = match state.tags.find_tag_by_name(owner, &name).await? {
            Some(Tag { id: Some(id), .. }) => id,
            _ => {
                let created = state.tags.create_tag(owner, &name).await?;
                log::info!("Created tag '{}' for {}", name, owner);
                created
                    .id
                    .ok_or_else(|| DomainError::Persistence(format!("tag '{}' was stored without an id", name)))?
            }
        };
        ids.insert(id);
    }
    Ok(ids)
}
