//! Bean Commands
//!
//! Bean CRUD with tag reconciliation and cascading delete.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::{Bean, CascadeStage, DomainError, DomainResult, OwnerId, ResourceKind, Tag};
use crate::repository::sync_tags;
use crate::AppState;
use super::tag_cmd::ensure_tags;

/// What a successful bean delete removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanDeletion {
    pub bean_id: u32,
    /// Dependent brews, in deletion order
    pub deleted_brews: Vec<u32>,
}

/// Create a bean and attach its tags
pub async fn create_bean(state: &AppState, owner: OwnerId, bean: Bean, tags: &[Tag]) -> DomainResult<Bean> {
    bean.validate()?;
    let desired = ensure_tags(state, owner, tags).await?;

    let mut created = state.beans.create(owner, &bean).await?;

    if let Err(e) = sync_tags(state.tag_links.as_ref(), owner, ResourceKind::Bean, created.id, &desired).await {
        log::warn!("Tagging new bean {} failed, removing it: {}", created.id, e);
        discard_bean(state, owner, created.id).await;
        return Err(e);
    }

    created.tag_ids = desired.into_iter().collect();
    log::info!("Created bean {} '{}' for {}", created.id, created.name, owner);
    Ok(created)
}

/// Get bean by ID
pub async fn get_bean(state: &AppState, owner: OwnerId, id: u32) -> DomainResult<Bean> {
    state
        .beans
        .find_by_id(owner, id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("bean {}", id)))
}

/// List all beans of the owner, newest first
pub async fn list_beans(state: &AppState, owner: OwnerId) -> DomainResult<Vec<Bean>> {
    state.beans.list(owner).await
}

/// Update a bean. When `tags` is given the bean's tags are reconciled to it.
pub async fn update_bean(state: &AppState, owner: OwnerId, bean: Bean, tags: Option<&[Tag]>) -> DomainResult<Bean> {
    bean.validate()?;
    let desired = match tags {
        Some(tags) => Some(ensure_tags(state, owner, tags).await?),
        None => None,
    };

    state.beans.update(owner, &bean).await?;

    if let Some(desired) = desired {
        sync_tags(state.tag_links.as_ref(), owner, ResourceKind::Bean, bean.id, &desired).await?;
    }
    get_bean(state, owner, bean.id).await
}

/// Delete a bean with all of its brews.
///
/// Each brew is untagged and deleted in id order, then the bean is untagged
/// and deleted. The first failing step stops the cascade; steps already done
/// stay done and the error names the failing step.
pub async fn delete_bean(state: &AppState, owner: OwnerId, id: u32) -> DomainResult<BeanDeletion> {
    get_bean(state, owner, id).await?;
    let links = state.tag_links.as_ref();
    let no_tags = BTreeSet::new();

    let brews = state.brews.list_for_bean(owner, id).await?;
    let mut deleted_brews = Vec::with_capacity(brews.len());

    for brew in brews {
        sync_tags(links, owner, ResourceKind::Brew, brew.id, &no_tags)
            .await
            .map_err(|e| e.at_stage(CascadeStage::BrewTags(brew.id)))?;
        state
            .brews
            .delete(owner, brew.id)
            .await
            .map_err(|e| e.at_stage(CascadeStage::Brew(brew.id)))?;
        deleted_brews.push(brew.id);
    }

    sync_tags(links, owner, ResourceKind::Bean, id, &no_tags)
        .await
        .map_err(|e| e.at_stage(CascadeStage::BeanTags(id)))?;
    state
        .beans
        .delete(owner, id)
        .await
        .map_err(|e| e.at_stage(CascadeStage::Bean(id)))?;

    log::info!("Deleted bean {} of {} with {} brews", id, owner, deleted_brews.len());
    Ok(BeanDeletion {
        bean_id: id,
        deleted_brews,
    })
}

/// Best-effort removal of a bean whose creation could not be completed
async fn discard_bean(state: &AppState, owner: OwnerId, id: u32) {
    if let Err(e) = state.tag_links.unlink_all(owner, ResourceKind::Bean, id).await {
        log::error!("Failed to unlink tags of discarded bean {}: {}", id, e);
        return;
    }
    if let Err(e) = state.beans.delete(owner, id).await {
        log::error!("Failed to remove discarded bean {}: {}", id, e);
    }
}
