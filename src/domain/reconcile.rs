//! Tag Reconciliation
//!
//! Diff a resource's desired tag set against the stored one and express the
//! difference as link/unlink operations scoped to a single owner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::entity::{DomainError, DomainResult, OwnerId};

/// Kind of resource that carries tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Bean,
    Brew,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Bean => "bean",
            ResourceKind::Brew => "brew",
        }
    }

    /// Table holding the resource rows
    pub fn table(&self) -> &'static str {
        match self {
            ResourceKind::Bean => "beans",
            ResourceKind::Brew => "brews",
        }
    }

    /// Association table for this kind
    pub fn link_table(&self) -> &'static str {
        match self {
            ResourceKind::Bean => "bean_tags",
            ResourceKind::Brew => "brew_tags",
        }
    }

    /// Column in the association table referencing the resource
    pub fn link_column(&self) -> &'static str {
        match self {
            ResourceKind::Bean => "bean_id",
            ResourceKind::Brew => "brew_id",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single write against an association table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum TagLinkOp {
    /// Insert the association if it is absent
    Link {
        owner: OwnerId,
        kind: ResourceKind,
        resource_id: u32,
        tag_id: u32,
    },
    /// Delete the association
    Unlink {
        owner: OwnerId,
        kind: ResourceKind,
        resource_id: u32,
        tag_id: u32,
    },
}

/// Result of reconciling one resource's tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDiff {
    pub owner: OwnerId,
    pub kind: ResourceKind,
    pub resource_id: u32,
    pub to_add: BTreeSet<u32>,
    pub to_remove: BTreeSet<u32>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Operations in the order they are applied: removals, then additions
    pub fn operations(&self) -> Vec<TagLinkOp> {
        let (owner, kind, resource_id) = (self.owner, self.kind, self.resource_id);
        let unlinks = self.to_remove.iter().map(|&tag_id| TagLinkOp::Unlink {
            owner,
            kind,
            resource_id,
            tag_id,
        });
        let links = self.to_add.iter().map(|&tag_id| TagLinkOp::Link {
            owner,
            kind,
            resource_id,
            tag_id,
        });
        unlinks.chain(links).collect()
    }

    /// The association set after applying this diff to `current`
    pub fn apply_to(&self, current: &BTreeSet<u32>) -> BTreeSet<u32> {
        current
            .difference(&self.to_remove)
            .chain(self.to_add.iter())
            .copied()
            .collect()
    }
}

/// Collect tag ids into a set, rejecting malformed ids
pub fn tag_id_set<I>(ids: I) -> DomainResult<BTreeSet<u32>>
where
    I: IntoIterator<Item = u32>,
{
    let mut set = BTreeSet::new();
    for id in ids {
        if id == 0 {
            return Err(DomainError::Validation("tag id 0 is not a valid tag".into()));
        }
        set.insert(id);
    }
    Ok(set)
}

/// Compute the link/unlink sets that move `current` to `desired`
pub fn reconcile_tags(
    owner: OwnerId,
    resource_id: u32,
    kind: ResourceKind,
    desired: &BTreeSet<u32>,
    current: &BTreeSet<u32>,
) -> TagDiff {
    TagDiff {
        owner,
        kind,
        resource_id,
        to_add: desired.difference(current).copied().collect(),
        to_remove: current.difference(desired).copied().collect(),
    }
}
