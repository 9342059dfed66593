//! Local Application State Store
//!
//! Caller-side copy of one owner's data. Edits are applied locally first and
//! rolled back when persisting them fails.

use std::future::Future;

use crate::commands;
use crate::domain::{Bean, Brew, BrewSettings, DomainResult, OwnerId, Tag};
use crate::AppState;

/// Everything the brew log UI shows for one owner
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalStore {
    pub owner: OwnerId,
    pub beans: Vec<Bean>,
    pub brews: Vec<Brew>,
    pub tags: Vec<Tag>,
    /// Loaded lazily; `None` until first fetched
    pub settings: Option<BrewSettings>,
}

impl LocalStore {
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            ..Default::default()
        }
    }

    /// Load the owner's beans, brews, tags and settings
    pub async fn load(state: &AppState, owner: OwnerId) -> DomainResult<Self> {
        Ok(Self {
            owner,
            beans: commands::list_beans(state, owner).await?,
            brews: commands::list_brews(state, owner).await?,
            tags: commands::list_tags(state, owner).await?,
            settings: Some(commands::get_settings(state, owner).await?),
        })
    }

    /// Apply `edit` locally, then `persist` a snapshot of the edited state.
    ///
    /// On failure the store goes back to exactly what it held before the
    /// call and the persist error is returned.
    pub async fn commit_optimistic<E, P, Fut, R>(&mut self, edit: E, persist: P) -> DomainResult<R>
    where
        E: FnOnce(&mut LocalStore),
        P: FnOnce(LocalStore) -> Fut,
        Fut: Future<Output = DomainResult<R>>,
    {
        let snapshot = self.clone();
        edit(self);

        match persist(self.clone()).await {
            Ok(result) => Ok(result),
            Err(e) => {
                log::warn!("Rolling back local edit for {}: {}", self.owner, e);
                *self = snapshot;
                Err(e)
            }
        }
    }

    // ========================
    // Store Helper Functions
    // ========================

    /// Insert a bean, or replace the one with the same ID
    pub fn store_update_bean(&mut self, updated: Bean) {
        match self.beans.iter_mut().find(|bean| bean.id == updated.id) {
            Some(bean) => *bean = updated,
            None => self.beans.insert(0, updated),
        }
    }

    /// Remove a bean and its brews by bean ID
    pub fn store_remove_bean(&mut self, bean_id: u32) {
        self.beans.retain(|bean| bean.id != bean_id);
        self.brews.retain(|brew| brew.bean_id != bean_id);
    }

    /// Insert a brew, or replace the one with the same ID
    pub fn store_update_brew(&mut self, updated: Brew) {
        match self.brews.iter_mut().find(|brew| brew.id == updated.id) {
            Some(brew) => *brew = updated,
            None => self.brews.insert(0, updated),
        }
    }

    pub fn store_remove_brew(&mut self, brew_id: u32) {
        self.brews.retain(|brew| brew.id != brew_id);
    }

    /// Add a tag, or replace the one with the same ID
    pub fn store_update_tag(&mut self, updated: Tag) {
        match self.tags.iter_mut().find(|tag| tag.id == updated.id) {
            Some(tag) => *tag = updated,
            None => self.tags.push(updated),
        }
    }

    /// Remove a tag and drop it from every bean and brew
    pub fn store_remove_tag(&mut self, tag_id: u32) {
        self.tags.retain(|tag| tag.id != Some(tag_id));
        for bean in &mut self.beans {
            bean.tag_ids.retain(|id| *id != tag_id);
        }
        for brew in &mut self.brews {
            brew.tag_ids.retain(|id| *id != tag_id);
        }
    }

    /// Brews made with one bean
    pub fn brews_for_bean(&self, bean_id: u32) -> impl Iterator<Item = &Brew> {
        self.brews.iter().filter(move |brew| brew.bean_id == bean_id)
    }
}
