//! Bean Entity
//!
//! A bag of coffee beans. Brews hang off a bean.

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, Entity, OwnerId};

/// Roast level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoastLevel {
    Light,
    Medium,
    MediumDark,
    Dark,
}

impl RoastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastLevel::Light => "light",
            RoastLevel::Medium => "medium",
            RoastLevel::MediumDark => "medium-dark",
            RoastLevel::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(RoastLevel::Light),
            "medium" => Some(RoastLevel::Medium),
            "medium-dark" => Some(RoastLevel::MediumDark),
            "dark" => Some(RoastLevel::Dark),
            _ => None,
        }
    }
}

/// A coffee bean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bean {
    /// Unique identifier (0 until persisted)
    pub id: u32,
    pub owner: OwnerId,
    pub name: String,
    pub roaster: Option<String>,
    pub origin: Option<String>,
    /// Processing method (washed, natural, ...)
    pub process: Option<String>,
    pub roast_level: Option<RoastLevel>,
    /// Roast date as `YYYY-MM-DD`
    pub roast_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    /// Associated tag ids, sorted
    #[serde(default)]
    pub tag_ids: Vec<u32>,
}

impl Bean {
    /// Create a new, not yet persisted bean
    pub fn new(owner: OwnerId, name: String) -> Self {
        Self {
            id: 0,
            owner,
            name,
            roaster: None,
            origin: None,
            process: None,
            roast_level: None,
            roast_date: None,
            notes: None,
            created_at: None,
            updated_at: None,
            tag_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("bean name cannot be empty".into()));
        }
        if let Some(date) = &self.roast_date {
            chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                DomainError::Validation(format!("roast date '{}' is not YYYY-MM-DD", date))
            })?;
        }
        Ok(())
    }

    /// Days between roasting and `today`, if the roast date is known
    pub fn days_since_roast(&self, today: chrono::NaiveDate) -> Option<i64> {
        let roasted = chrono::NaiveDate::parse_from_str(self.roast_date.as_deref()?, "%Y-%m-%d").ok()?;
        Some((today - roasted).num_days())
    }
}

impl Entity for Bean {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}
