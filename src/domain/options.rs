//! Option Generator
//!
//! Turns a setting rule and a cup count into the ordered list of values a
//! user can pick from. Pure and deterministic; safe to call on every
//! cup-count change.

use super::settings::{OptionValue, SettingRule};

/// Cup count used when the caller has none (or passes 0)
pub const DEFAULT_CUPS: u32 = 1;

/// Map an absent or zero cup count to [`DEFAULT_CUPS`]
pub fn normalize_cups(cups: Option<u32>) -> u32 {
    match cups {
        Some(n) if n > 0 => n,
        _ => DEFAULT_CUPS,
    }
}

/// Values offered by `rule` for a brew of `cups` cups.
///
/// Fixed rules return their list unchanged. Dynamic rules produce
/// `cups * base + (i - numSteps / 2) * step + offset` for each index `i`, in
/// index order, and drop every value that is not strictly positive. Values
/// are returned exactly as computed.
pub fn generate_options(rule: &SettingRule, cups: u32) -> Vec<OptionValue> {
    let cups = normalize_cups(Some(cups));

    match rule {
        SettingRule::Fixed { fixed_options } => fixed_options.clone(),
        SettingRule::Dynamic {
            base_amount_per_cup,
            step_size,
            num_steps,
            offset,
        } => {
            let center = i64::from(num_steps / 2);
            let base = f64::from(cups) * base_amount_per_cup;

            (0..i64::from(*num_steps))
                .map(|i| base + (i - center) as f64 * step_size + offset)
                .filter(|value| *value > 0.0)
                .map(OptionValue::Number)
                .collect()
        }
    }
}
