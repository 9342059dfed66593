//! Domain Layer
//!
//! Contains all domain entities and the pure brewing logic: the option
//! generator and tag reconciliation. Nothing here performs I/O.

mod bean;
mod brew;
mod entity;
mod options;
mod reconcile;
mod settings;
mod tag;

pub use bean::{Bean, RoastLevel};
pub use brew::{Brew, BrewField, Pour, TasteRatings};
pub use entity::{CascadeStage, DomainError, DomainResult, Entity, OwnerId};
pub use options::{generate_options, normalize_cups, DEFAULT_CUPS};
pub use reconcile::{reconcile_tags, tag_id_set, ResourceKind, TagDiff, TagLinkOp};
pub use settings::{default_settings, BrewSettingOption, BrewSettings, OptionValue, SettingRule, MAX_NUM_STEPS};
pub use tag::{normalize_tag_name, Tag, MAX_TAG_NAME_LEN};
