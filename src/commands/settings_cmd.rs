//! Settings Commands
//!
//! Per-owner brew settings and the option lists offered on the brew form.

use serde::{Deserialize, Serialize};

use crate::domain::{
    default_settings, generate_options, normalize_cups, BrewSettingOption, BrewSettings, DomainError, DomainResult, OptionValue,
    OwnerId, SettingRule,
};
use crate::AppState;

/// Choices for one brew form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterOptions {
    pub key: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_label: Option<String>,
    pub is_numeric: bool,
    pub options: Vec<OptionValue>,
}

/// Settings of the owner. The first access stores the default template.
pub async fn get_settings(state: &AppState, owner: OwnerId) -> DomainResult<BrewSettings> {
    let template = default_settings();
    match state.settings.load_settings(owner).await? {
        Some(stored) => BrewSettings::merge_stored(stored, &template).map_err(|e| match e {
            DomainError::Validation(msg) => {
                DomainError::Persistence(format!("stored settings of {} are invalid: {}", owner, msg))
            }
            other => other,
        }),
        None => {
            state.settings.save_settings(owner, &template).await?;
            log::info!("Stored default brew settings for {}", owner);
            Ok(template)
        }
    }
}

/// Replace all settings of the owner
pub async fn update_settings(
    state: &AppState,
    owner: OwnerId,
    entries: Vec<BrewSettingOption>,
) -> DomainResult<BrewSettings> {
    let settings = BrewSettings::new(entries)?;
    state.settings.save_settings(owner, &settings).await?;
    log::info!("Updated brew settings for {} ({} entries)", owner, settings.len());
    Ok(settings)
}

/// Replace one setting, keeping the position of the others
pub async fn update_setting(
    state: &AppState,
    owner: OwnerId,
    option: BrewSettingOption,
) -> DomainResult<BrewSettings> {
    option.validate()?;
    let mut settings = get_settings(state, owner).await?;
    settings.upsert(option);
    settings.validate()?;
    state.settings.save_settings(owner, &settings).await?;
    Ok(settings)
}

/// Drop the owner's customizations and go back to the template
pub async fn reset_settings(state: &AppState, owner: OwnerId) -> DomainResult<BrewSettings> {
    let removed = state.settings.delete_settings(owner).await?;
    if removed {
        log::info!("Reset brew settings for {}", owner);
    }
    get_settings(state, owner).await
}

/// Options a rule would offer, without storing it
pub fn preview_setting(rule: &SettingRule, cups: Option<u32>) -> DomainResult<Vec<OptionValue>> {
    rule.validate()?;
    Ok(generate_options(rule, normalize_cups(cups)))
}

/// Every brew form field with its choices for the given cup count
pub async fn brew_form_options(
    state: &AppState,
    owner: OwnerId,
    cups: Option<u32>,
) -> DomainResult<Vec<ParameterOptions>> {
    let cups = normalize_cups(cups);
    let settings = get_settings(state, owner).await?;
    Ok(settings
        .entries()
        .iter()
        .map(|option| ParameterOptions {
            key: option.key.clone(),
            display_name: option.display_name.clone(),
            unit_label: option.unit_label.clone(),
            is_numeric: option.is_numeric,
            options: option.options(cups),
        })
        .collect())
}
