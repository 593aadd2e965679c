//! Provider-keyed setting handlers for HashMap<String, String> settings.

use std::collections::HashMap;

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::validate_provider;
use crate::cli::settings::SettingHandler;
use crate::core::config::Config;
use crate::core::providers::normalize_base_url;

/// Data-driven handler for per-provider string values.
pub struct ProviderKeyedHandler {
    key: &'static str,
    set_hint: &'static str,
    set_example: &'static str,
    unset_hint: &'static str,
    unset_example: &'static str,
    normalize: fn(String) -> String,
    map: fn(&mut Config) -> &mut HashMap<String, String>,
}

impl SettingHandler for ProviderKeyedHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.len() < 2 {
            return Err(SettingError::MissingArgs {
                hint: self.set_hint,
                example: self.set_example,
            });
        }

        let provider = validate_provider(&args[0])?;
        let value = (self.normalize)(args[1..].join(" "));
        (self.map)(config).insert(provider.to_string(), value.clone());

        Ok(format!(
            "✅ Set {} for provider '{provider}' to: {value}",
            self.key
        ))
    }

    fn unset(&self, arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        let provider = arg.ok_or(SettingError::MissingArgs {
            hint: self.unset_hint,
            example: self.unset_example,
        })?;
        let provider = validate_provider(provider)?;
        (self.map)(config).remove(provider.as_str());

        Ok(format!("✅ Unset {} for provider: {provider}", self.key))
    }
}

/// Create a handler for the `default-model` setting.
pub fn default_model_handler() -> ProviderKeyedHandler {
    ProviderKeyedHandler {
        key: "default-model",
        set_hint: "To set a default model, specify the provider and model:",
        set_example: "parley set default-model openai gpt-4o",
        unset_hint: "To unset a default model, specify the provider:",
        unset_example: "parley unset default-model openai",
        normalize: |value| value,
        map: |c| &mut c.default_models,
    }
}

/// Create a handler for the `base-url` setting.
pub fn base_url_handler() -> ProviderKeyedHandler {
    ProviderKeyedHandler {
        key: "base-url",
        set_hint: "To override a provider's API base URL, specify the provider and URL:",
        set_example: "parley set base-url openai http://localhost:8080/v1",
        unset_hint: "To restore a provider's built-in base URL, specify the provider:",
        unset_example: "parley unset base-url openai",
        normalize: |value| normalize_base_url(&value),
        map: |c| &mut c.base_urls,
    }
}
