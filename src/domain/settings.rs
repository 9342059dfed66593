//! Brew Settings
//!
//! Per-owner rules describing which values are offered for each brew
//! parameter. A rule is either a fixed list of choices or an arithmetic
//! progression scaled by the cup count.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::brew::BrewField;
use super::entity::{DomainError, DomainResult};
use super::options::generate_options;

/// Upper bound on `numSteps` for a dynamic rule
pub const MAX_NUM_STEPS: u32 = 100;

/// A selectable value: a number or a free-form label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Number(f64),
    Text(String),
}

impl OptionValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            OptionValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Number(_) => None,
            OptionValue::Text(s) => Some(s),
        }
    }
}

impl From<f64> for OptionValue {
    fn from(n: f64) -> Self {
        OptionValue::Number(n)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Number(n) => {
                // Six decimals hide float noise like 0.30000000000000004
                let fixed = format!("{:.6}", n);
                let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
                match trimmed {
                    "0" | "-0" if *n != 0.0 => write!(f, "{}", n),
                    "-0" => f.write_str("0"),
                    _ => f.write_str(trimmed),
                }
            }
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

/// How the choices for a parameter are produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SettingRule {
    /// Explicit choices, shown in the given order
    #[serde(rename_all = "camelCase")]
    Fixed { fixed_options: Vec<OptionValue> },
    /// `numSteps` values centered on `cups * baseAmountPerCup`, `stepSize`
    /// apart, shifted by `offset`
    #[serde(rename_all = "camelCase")]
    Dynamic {
        base_amount_per_cup: f64,
        step_size: f64,
        num_steps: u32,
        #[serde(default)]
        offset: f64,
    },
}

impl SettingRule {
    pub fn fixed<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<OptionValue>,
    {
        SettingRule::Fixed {
            fixed_options: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dynamic(base_amount_per_cup: f64, step_size: f64, num_steps: u32, offset: f64) -> Self {
        SettingRule::Dynamic {
            base_amount_per_cup,
            step_size,
            num_steps,
            offset,
        }
    }

    /// Check the rule on its own, independent of the parameter it drives
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            SettingRule::Fixed { fixed_options } => {
                for value in fixed_options {
                    if let OptionValue::Number(n) = value {
                        if !n.is_finite() {
                            return Err(DomainError::Validation(format!(
                                "fixed option {} is not a finite number",
                                n
                            )));
                        }
                    }
                }
                Ok(())
            }
            SettingRule::Dynamic {
                base_amount_per_cup,
                step_size,
                num_steps,
                offset,
            } => {
                let knobs = [
                    ("baseAmountPerCup", base_amount_per_cup),
                    ("stepSize", step_size),
                    ("offset", offset),
                ];
                for (name, value) in knobs {
                    if !value.is_finite() {
                        return Err(DomainError::Validation(format!(
                            "{} must be a finite number",
                            name
                        )));
                    }
                }
                if *num_steps > MAX_NUM_STEPS {
                    return Err(DomainError::Validation(format!(
                        "numSteps must be at most {}, got {}",
                        MAX_NUM_STEPS, num_steps
                    )));
                }
                Ok(())
            }
        }
    }

    /// Parse a rule from JSON, reporting malformed input as a validation error
    pub fn from_json(value: serde_json::Value) -> DomainResult<Self> {
        let rule: SettingRule = serde_json::from_value(value)
            .map_err(|e| DomainError::Validation(format!("malformed rule: {}", e)))?;
        rule.validate()?;
        Ok(rule)
    }
}

/// One brew parameter: display metadata plus its rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrewSettingOption {
    /// Brew field this parameter fills
    pub key: String,
    pub display_name: String,
    pub is_numeric: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_label: Option<String>,
    #[serde(flatten)]
    pub rule: SettingRule,
}

impl BrewSettingOption {
    pub fn new(field: BrewField, display_name: &str, rule: SettingRule) -> Self {
        Self {
            key: field.key().to_string(),
            display_name: display_name.to_string(),
            is_numeric: field.is_numeric(),
            unit_label: None,
            rule,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit_label = Some(unit.to_string());
        self
    }

    /// The brew field named by `key`
    pub fn field(&self) -> DomainResult<BrewField> {
        BrewField::from_key(&self.key)
            .ok_or_else(|| DomainError::Validation(format!("unknown setting key '{}'", self.key)))
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.display_name.trim().is_empty() {
            return Err(DomainError::Validation(format!(
                "setting '{}' needs a display name",
                self.key
            )));
        }

        let field = self.field()?;
        if field.is_numeric() != self.is_numeric {
            return Err(DomainError::Validation(format!(
                "setting '{}' must have isNumeric = {}",
                self.key,
                field.is_numeric()
            )));
        }

        self.rule
            .validate()
            .map_err(|e| DomainError::Validation(format!("setting '{}': {}", self.key, e)))?;

        match &self.rule {
            SettingRule::Dynamic { .. } if !self.is_numeric => Err(DomainError::Validation(format!(
                "setting '{}' is not numeric and cannot use a dynamic rule",
                self.key
            ))),
            SettingRule::Fixed { fixed_options } if self.is_numeric => {
                match fixed_options.iter().find(|v| v.as_number().is_none()) {
                    Some(text) => Err(DomainError::Validation(format!(
                        "setting '{}' is numeric but offers '{}'",
                        self.key, text
                    ))),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Choices offered for this parameter at the given cup count
    pub fn options(&self, cups: u32) -> Vec<OptionValue> {
        generate_options(&self.rule, cups)
    }
}

/// Ordered settings for one owner. List order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrewSettings {
    entries: Vec<BrewSettingOption>,
}

impl BrewSettings {
    /// Build validated settings from entries in display order
    pub fn new(entries: Vec<BrewSettingOption>) -> DomainResult<Self> {
        let settings = Self { entries };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.key.as_str()) {
                return Err(DomainError::Validation(format!(
                    "duplicate setting key '{}'",
                    entry.key
                )));
            }
            entry.validate()?;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[BrewSettingOption] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<BrewSettingOption> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&BrewSettingOption> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut BrewSettingOption> {
        self.entries.iter_mut().find(|e| e.key == key)
    }

    /// Replace the entry with the same key in place, or append it
    pub fn upsert(&mut self, option: BrewSettingOption) {
        match self.get_mut(&option.key) {
            Some(existing) => *existing = option,
            None => self.entries.push(option),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<BrewSettingOption> {
        let index = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(index))
    }

    /// Choices for one parameter
    pub fn options_for(&self, key: &str, cups: u32) -> DomainResult<Vec<OptionValue>> {
        self.get(key)
            .map(|option| option.options(cups))
            .ok_or_else(|| DomainError::NotFound(format!("setting '{}'", key)))
    }

    /// Choices for every parameter, in display order
    pub fn all_options(&self, cups: u32) -> Vec<(String, Vec<OptionValue>)> {
        self.entries
            .iter()
            .map(|option| (option.key.clone(), option.options(cups)))
            .collect()
    }

    /// Combine a stored document with the built-in template.
    ///
    /// Stored entries keep their order and values. Keys that no longer map
    /// to a brew field are dropped; template keys the document lacks are
    /// appended in template order.
    pub fn merge_stored(stored: Vec<BrewSettingOption>, template: &BrewSettings) -> DomainResult<Self> {
        let mut entries: Vec<BrewSettingOption> = Vec::with_capacity(template.len());
        for entry in stored {
            if BrewField::from_key(&entry.key).is_none() {
                log::warn!("Dropping stored setting with unknown key '{}'", entry.key);
                continue;
            }
            entries.push(entry);
        }

        for default in template.entries() {
            if !entries.iter().any(|e| e.key == default.key) {
                entries.push(default.clone());
            }
        }

        Self::new(entries)
    }
}

/// Built-in template every owner starts from. Returns a fresh value on each
/// call; callers own and may modify their copy.
pub fn default_settings() -> BrewSettings {
    BrewSettings {
        entries: vec![
            BrewSettingOption::new(BrewField::Cups, "Cups", SettingRule::fixed([1.0, 2.0, 3.0, 4.0])),
            BrewSettingOption::new(BrewField::BeanAmount, "Coffee", SettingRule::dynamic(15.0, 1.0, 7, 0.0))
                .with_unit("g"),
            BrewSettingOption::new(BrewField::WaterAmount, "Water", SettingRule::dynamic(250.0, 10.0, 5, 0.0))
                .with_unit("ml"),
            BrewSettingOption::new(
                BrewField::GrindSize,
                "Grind size",
                SettingRule::fixed(["extra fine", "fine", "medium-fine", "medium", "medium-coarse", "coarse"]),
            ),
            BrewSettingOption::new(
                BrewField::WaterTemperature,
                "Water temperature",
                SettingRule::fixed([85.0, 88.0, 90.0, 92.0, 94.0, 96.0]),
            )
            .with_unit("°C"),
            BrewSettingOption::new(
                BrewField::BrewTime,
                "Brew time",
                SettingRule::fixed([120.0, 150.0, 180.0, 210.0, 240.0]),
            )
            .with_unit("s"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_template_is_valid() {
        let settings = default_settings();
        settings.validate().expect("template must validate");
        assert_eq!(
            settings.keys().collect::<Vec<_>>(),
            vec!["cups", "bean_amount", "water_amount", "grind_size", "water_temperature", "brew_time"]
        );
    }

    #[test]
    fn test_default_template_is_fresh_each_call() {
        let mut mine = default_settings();
        mine.upsert(BrewSettingOption::new(
            BrewField::BeanAmount,
            "Coffee",
            SettingRule::dynamic(20.0, 2.0, 3, 0.0),
        ));

        let pristine = default_settings();
        assert_eq!(
            pristine.get("bean_amount").unwrap().rule,
            SettingRule::dynamic(15.0, 1.0, 7, 0.0)
        );
    }

    #[test]
    fn test_rule_json_shape() {
        let option = BrewSettingOption::new(BrewField::BeanAmount, "Coffee", SettingRule::dynamic(10.0, 2.0, 5, 0.0))
            .with_unit("g");
        let value = serde_json::to_value(&option).unwrap();
        assert_eq!(
            value,
            json!({
                "key": "bean_amount",
                "displayName": "Coffee",
                "isNumeric": true,
                "unitLabel": "g",
                "type": "dynamic",
                "baseAmountPerCup": 10.0,
                "stepSize": 2.0,
                "numSteps": 5,
                "offset": 0.0
            })
        );
    }

    #[test]
    fn test_fixed_rule_keeps_mixed_values() {
        let rule = SettingRule::from_json(json!({
            "type": "fixed",
            "fixedOptions": ["fine", 3, "coarse"]
        }))
        .unwrap();
        assert_eq!(
            rule,
            SettingRule::Fixed {
                fixed_options: vec!["fine".into(), 3.0.into(), "coarse".into()]
            }
        );
    }

    #[test]
    fn test_dynamic_rule_missing_num_steps_is_validation_error() {
        let result = SettingRule::from_json(json!({
            "type": "dynamic",
            "baseAmountPerCup": 10,
            "stepSize": 1
        }));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_negative_num_steps_rejected() {
        let result = SettingRule::from_json(json!({
            "type": "dynamic",
            "baseAmountPerCup": 10,
            "stepSize": 1,
            "numSteps": -3
        }));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_offset_defaults_to_zero() {
        let rule = SettingRule::from_json(json!({
            "type": "dynamic",
            "baseAmountPerCup": 10,
            "stepSize": 1,
            "numSteps": 3
        }))
        .unwrap();
        assert_eq!(rule, SettingRule::dynamic(10.0, 1.0, 3, 0.0));
    }

    #[test]
    fn test_too_many_steps_rejected() {
        let rule = SettingRule::dynamic(10.0, 1.0, MAX_NUM_STEPS + 1, 0.0);
        assert!(matches!(rule.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let entry = BrewSettingOption::new(BrewField::Cups, "Cups", SettingRule::fixed([1.0]));
        let result = BrewSettings::new(vec![entry.clone(), entry]);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_text_in_numeric_setting_rejected() {
        let entry = BrewSettingOption::new(BrewField::WaterTemperature, "Temp", SettingRule::fixed(["hot"]));
        assert!(matches!(entry.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_dynamic_rule_on_text_field_rejected() {
        let entry = BrewSettingOption::new(BrewField::GrindSize, "Grind", SettingRule::dynamic(1.0, 1.0, 3, 0.0));
        assert!(matches!(entry.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut entry = BrewSettingOption::new(BrewField::Cups, "Cups", SettingRule::fixed([1.0]));
        entry.key = "bloom_time".to_string();
        assert!(matches!(entry.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut settings = default_settings();
        settings.upsert(BrewSettingOption::new(
            BrewField::WaterAmount,
            "Water",
            SettingRule::fixed([200.0, 300.0]),
        ));
        assert_eq!(settings.keys().nth(2), Some("water_amount"));
        assert_eq!(settings.len(), default_settings().len());
    }

    #[test]
    fn test_merge_keeps_stored_order_and_appends_missing() {
        let template = default_settings();
        let stored = vec![
            BrewSettingOption::new(BrewField::GrindSize, "Grind", SettingRule::fixed(["fine", "coarse"])),
            BrewSettingOption::new(BrewField::BeanAmount, "Dose", SettingRule::dynamic(18.0, 0.5, 3, 1.0)),
        ];

        let merged = BrewSettings::merge_stored(stored, &template).unwrap();
        assert_eq!(
            merged.keys().collect::<Vec<_>>(),
            vec!["grind_size", "bean_amount", "cups", "water_amount", "water_temperature", "brew_time"]
        );
        assert_eq!(
            merged.get("bean_amount").unwrap().rule,
            SettingRule::dynamic(18.0, 0.5, 3, 1.0)
        );
    }

    #[test]
    fn test_merge_drops_unknown_keys() {
        let mut stale = BrewSettingOption::new(BrewField::Cups, "Bloom", SettingRule::fixed([30.0]));
        stale.key = "bloom_time".to_string();

        let merged = BrewSettings::merge_stored(vec![stale], &default_settings()).unwrap();
        assert!(merged.get("bloom_time").is_none());
        assert_eq!(merged.len(), default_settings().len());
    }

    #[test]
    fn test_options_for_unknown_key() {
        let settings = default_settings();
        assert!(matches!(settings.options_for("nope", 1), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_option_value_display() {
        assert_eq!(OptionValue::Number(15.0).to_string(), "15");
        assert_eq!(OptionValue::Number(15.5).to_string(), "15.5");
        assert_eq!(OptionValue::from("fine").to_string(), "fine");
        assert_eq!(OptionValue::Number(0.1 + 0.2).to_string(), "0.3");
        assert_eq!(OptionValue::Number(0.0000004).to_string(), "0.0000004");
        assert_eq!(OptionValue::Number(1e20).to_string(), "100000000000000000000");
    }
}
