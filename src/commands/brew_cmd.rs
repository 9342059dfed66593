//! Brew Commands
//!
//! Brew CRUD with tag reconciliation.

use std::collections::BTreeSet;

use crate::domain::{Brew, DomainError, DomainResult, OwnerId, ResourceKind, Tag};
use crate::repository::sync_tags;
use crate::AppState;
use super::bean_cmd::get_bean;
use super::tag_cmd::ensure_tags;

/// Create a brew and attach its tags
pub async fn create_brew(state: &AppState, owner: OwnerId, brew: Brew, tags: &[Tag]) -> DomainResult<Brew> {
    brew.validate()?;
    get_bean(state, owner, brew.bean_id).await?;
    let desired = ensure_tags(state, owner, tags).await?;

    let mut created = state.brews.create(owner, &brew).await?;

    if let Err(e) = sync_tags(state.tag_links.as_ref(), owner, ResourceKind::Brew, created.id, &desired).await {
        log::warn!("Tagging new brew {} failed, removing it: {}", created.id, e);
        discard_brew(state, owner, created.id).await;
        return Err(e);
    }

    created.tag_ids = desired.into_iter().collect();
    log::info!("Created brew {} of bean {} for {}", created.id, created.bean_id, owner);
    Ok(created)
}

/// Get brew by ID
pub async fn get_brew(state: &AppState, owner: OwnerId, id: u32) -> DomainResult<Brew> {
    state
        .brews
        .find_by_id(owner, id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("brew {}", id)))
}

/// List all brews of the owner, newest first
pub async fn list_brews(state: &AppState, owner: OwnerId) -> DomainResult<Vec<Brew>> {
    state.brews.list(owner).await
}

/// List brews made with one bean
pub async fn list_brews_for_bean(state: &AppState, owner: OwnerId, bean_id: u32) -> DomainResult<Vec<Brew>> {
    get_bean(state, owner, bean_id).await?;
    state.brews.list_for_bean(owner, bean_id).await
}

/// Update a brew. When `tags` is given the brew's tags are reconciled to it.
pub async fn update_brew(state: &AppState, owner: OwnerId, brew: Brew, tags: Option<&[Tag]>) -> DomainResult<Brew> {
    brew.validate()?;
    let desired = match tags {
        Some(tags) => Some(ensure_tags(state, owner, tags).await?),
        None => None,
    };

    state.brews.update(owner, &brew).await?;

    if let Some(desired) = desired {
        sync_tags(state.tag_links.as_ref(), owner, ResourceKind::Brew, brew.id, &desired).await?;
    }
    get_brew(state, owner, brew.id).await
}

/// Delete a brew. Its tags are unlinked first; if that fails the brew stays.
pub async fn delete_brew(state: &AppState, owner: OwnerId, id: u32) -> DomainResult<()> {
    get_brew(state, owner, id).await?;
    sync_tags(state.tag_links.as_ref(), owner, ResourceKind::Brew, id, &BTreeSet::new()).await?;
    state.brews.delete(owner, id).await?;
    log::info!("Deleted brew {} of {}", id, owner);
    Ok(())
}

/// Best-effort removal of a brew whose creation could not be completed
async fn discard_brew(state: &AppState, owner: OwnerId, id: u32) {
    if let Err(e) = state.tag_links.unlink_all(owner, ResourceKind::Brew, id).await {
        log::error!("Failed to unlink tags of discarded brew {}: {}", id, e);
        return;
    }
    if let Err(e) = state.brews.delete(owner, id).await {
        log::error!("Failed to remove discarded brew {}: {}", id, e);
    }
}
