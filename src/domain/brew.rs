//! Brew Entity
//!
//! A single brew session made with one bean.

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, Entity, OwnerId};
use super::settings::OptionValue;

/// Brew parameters that can be driven by a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrewField {
    Cups,
    BeanAmount,
    WaterAmount,
    GrindSize,
    WaterTemperature,
    BrewTime,
}

impl BrewField {
    pub const ALL: [BrewField; 6] = [
        BrewField::Cups,
        BrewField::BeanAmount,
        BrewField::WaterAmount,
        BrewField::GrindSize,
        BrewField::WaterTemperature,
        BrewField::BrewTime,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            BrewField::Cups => "cups",
            BrewField::BeanAmount => "bean_amount",
            BrewField::WaterAmount => "water_amount",
            BrewField::GrindSize => "grind_size",
            BrewField::WaterTemperature => "water_temperature",
            BrewField::BrewTime => "brew_time",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Whether the field holds a number (otherwise free text)
    pub fn is_numeric(&self) -> bool {
        !matches!(self, BrewField::GrindSize)
    }
}

/// One pour of the pour schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pour {
    /// Seconds since the brew started
    pub at_seconds: u32,
    /// Water poured, in ml
    pub water_amount: f64,
}

/// Taste ratings, each 1..=5
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasteRatings {
    pub acidity: Option<u8>,
    pub sweetness: Option<u8>,
    pub bitterness: Option<u8>,
    pub body: Option<u8>,
    /// Overall rating
    pub rating: Option<u8>,
}

impl TasteRatings {
    pub fn validate(&self) -> DomainResult<()> {
        let scores = [
            ("acidity", self.acidity),
            ("sweetness", self.sweetness),
            ("bitterness", self.bitterness),
            ("body", self.body),
            ("rating", self.rating),
        ];
        for (name, score) in scores {
            if let Some(score) = score {
                if !(1..=5).contains(&score) {
                    return Err(DomainError::Validation(format!(
                        "{} must be between 1 and 5, got {}",
                        name, score
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A brew session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brew {
    /// Unique identifier (0 until persisted)
    pub id: u32,
    pub owner: OwnerId,
    pub bean_id: u32,
    pub cups: u32,
    /// Coffee dose in grams
    pub bean_amount: Option<f64>,
    /// Water in ml
    pub water_amount: Option<f64>,
    pub grind_size: Option<String>,
    /// Water temperature in °C
    pub water_temperature: Option<f64>,
    /// Total brew time in seconds
    pub brew_time: Option<f64>,
    pub pours: Vec<Pour>,
    pub taste: TasteRatings,
    pub notes: Option<String>,
    pub brewed_at: i64,
    pub updated_at: Option<i64>,
    /// Associated tag ids, sorted
    #[serde(default)]
    pub tag_ids: Vec<u32>,
}

impl Brew {
    /// Create a new, not yet persisted brew
    pub fn new(owner: OwnerId, bean_id: u32, cups: u32) -> Self {
        Self {
            id: 0,
            owner,
            bean_id,
            cups,
            bean_amount: None,
            water_amount: None,
            grind_size: None,
            water_temperature: None,
            brew_time: None,
            pours: Vec::new(),
            taste: TasteRatings::default(),
            notes: None,
            brewed_at: chrono::Utc::now().timestamp_millis(),
            updated_at: None,
            tag_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.cups == 0 {
            return Err(DomainError::Validation("cups must be at least 1".into()));
        }

        let amounts = [
            ("bean_amount", self.bean_amount),
            ("water_amount", self.water_amount),
            ("water_temperature", self.water_temperature),
            ("brew_time", self.brew_time),
        ];
        for (name, amount) in amounts {
            if let Some(value) = amount {
                if !value.is_finite() || value <= 0.0 {
                    return Err(DomainError::Validation(format!(
                        "{} must be a positive number",
                        name
                    )));
                }
            }
        }

        let mut last_pour = None;
        for pour in &self.pours {
            if !pour.water_amount.is_finite() || pour.water_amount <= 0.0 {
                return Err(DomainError::Validation("pour amount must be positive".into()));
            }
            if last_pour.is_some_and(|at| pour.at_seconds < at) {
                return Err(DomainError::Validation("pours must be in time order".into()));
            }
            last_pour = Some(pour.at_seconds);
        }

        self.taste.validate()
    }

    /// Assign a value picked from a setting's options to its brew field
    pub fn apply_setting(&mut self, field: BrewField, value: &OptionValue) -> DomainResult<()> {
        let mismatch = || {
            DomainError::Validation(format!(
                "value '{}' does not fit brew field '{}'",
                value,
                field.key()
            ))
        };

        match field {
            BrewField::GrindSize => {
                let text = value.as_text().ok_or_else(mismatch)?;
                self.grind_size = Some(text.to_string());
            }
            BrewField::Cups => {
                let n = value.as_number().ok_or_else(mismatch)?;
                if n < 1.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
                    return Err(mismatch());
                }
                self.cups = n as u32;
            }
            BrewField::BeanAmount => self.bean_amount = Some(value.as_number().ok_or_else(mismatch)?),
            BrewField::WaterAmount => self.water_amount = Some(value.as_number().ok_or_else(mismatch)?),
            BrewField::WaterTemperature => {
                self.water_temperature = Some(value.as_number().ok_or_else(mismatch)?)
            }
            BrewField::BrewTime => self.brew_time = Some(value.as_number().ok_or_else(mismatch)?),
        }
        Ok(())
    }

    /// Current value of a setting-driven field, if set
    pub fn setting_value(&self, field: BrewField) -> Option<OptionValue> {
        match field {
            BrewField::Cups => Some(OptionValue::Number(f64::from(self.cups))),
            BrewField::BeanAmount => self.bean_amount.map(OptionValue::Number),
            BrewField::WaterAmount => self.water_amount.map(OptionValue::Number),
            BrewField::GrindSize => self.grind_size.clone().map(OptionValue::Text),
            BrewField::WaterTemperature => self.water_temperature.map(OptionValue::Number),
            BrewField::BrewTime => self.brew_time.map(OptionValue::Number),
        }
    }

    /// Brew ratio (water / coffee), when both amounts are known
    pub fn ratio(&self) -> Option<f64> {
        match (self.bean_amount, self.water_amount) {
            (Some(bean), Some(water)) if bean > 0.0 => Some(water / bean),
            _ => None,
        }
    }
}

impl Entity for Brew {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}
