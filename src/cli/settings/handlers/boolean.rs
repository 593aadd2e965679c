//! Boolean setting handlers for on/off settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{format_bool, parse_bool};
use crate::cli::settings::SettingHandler;
use crate::core::config::Config;

/// Data-driven handler for boolean (on/off) settings.
pub struct BooleanHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    set_field: fn(&mut Config, Option<bool>),
}

impl SettingHandler for BooleanHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let input = args.join(" ");
        let value = parse_bool(&input).ok_or(SettingError::InvalidBoolean(input))?;
        (self.set_field)(config, Some(value));

        Ok(format!("✅ Set {} to: {}", self.key, format_bool(value)))
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        (self.set_field)(config, None);
        Ok(format!(
            "✅ Unset {} (will use default: {})",
            self.key, self.default_display
        ))
    }
}

/// Create a handler for the `resume-after-save` setting.
pub fn resume_after_save_handler() -> BooleanHandler {
    BooleanHandler {
        key: "resume-after-save",
        hint: "To choose whether a message is resent after saving a key, specify on or off:",
        example: "parley set resume-after-save off",
        default_display: "on",
        set_field: |c, v| c.resume_after_save = v,
    }
}
