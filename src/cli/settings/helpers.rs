//! Helper functions for settings operations.

use crate::core::providers::ProviderId;

use super::error::SettingError;

/// Parse a boolean value from user input.
///
/// Accepts: on/off, true/false, yes/no (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Format a boolean value for display.
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Resolve a provider identifier, case-insensitively.
pub fn validate_provider(input: &str) -> Result<ProviderId, SettingError> {
    input.parse().map_err(|_| SettingError::UnknownProvider {
        input: input.to_string(),
    })
}

pub fn success_set(key: &str, value: &str) -> String {
    format!("✅ Set {key} to: {value}")
}

pub fn success_unset(key: &str) -> String {
    format!("✅ Unset {key}")
}
