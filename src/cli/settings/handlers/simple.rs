//! Simple setting handlers for single-value settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{success_set, success_unset, validate_provider};
use crate::cli::settings::SettingHandler;
use crate::core::config::data::DEFAULT_REPROMPT_DELAY_MS;
use crate::core::config::{Config, CredentialStoreKind};

/// Handler for the `default-provider` setting.
pub struct DefaultProviderHandler;

impl SettingHandler for DefaultProviderHandler {
    fn key(&self) -> &'static str {
        "default-provider"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set a default provider, specify the provider:",
                example: "parley set default-provider gemini",
            });
        }

        let provider = validate_provider(&args.join(" "))?;
        config.default_provider = Some(provider.to_string());
        Ok(success_set("default-provider", provider.as_str()))
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        config.default_provider = None;
        Ok(success_unset("default-provider"))
    }
}

/// Handler for the `credential-store` setting.
pub struct CredentialStoreHandler;

impl SettingHandler for CredentialStoreHandler {
    fn key(&self) -> &'static str {
        "credential-store"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To choose where API keys are kept, specify keyring or file:",
                example: "parley set credential-store file",
            });
        }

        let input = args.join(" ");
        let kind: CredentialStoreKind =
            input.parse().map_err(|_| SettingError::InvalidValue {
                key: "credential-store",
                input: input.clone(),
                expected: "'keyring' or 'file'",
            })?;
        config.credential_store = Some(kind);
        Ok(success_set("credential-store", kind.as_str()))
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        config.credential_store = None;
        Ok(format!(
            "{} (will use default: {})",
            success_unset("credential-store"),
            CredentialStoreKind::default()
        ))
    }
}

/// Handler for the `reprompt-delay-ms` setting.
pub struct RepromptDelayHandler;

impl SettingHandler for RepromptDelayHandler {
    fn key(&self) -> &'static str {
        "reprompt-delay-ms"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set the delay before asking for a new key after a failure, specify milliseconds:",
                example: "parley set reprompt-delay-ms 500",
            });
        }

        let input = args.join(" ");
        let millis: u64 = input.trim().parse().map_err(|_| SettingError::InvalidValue {
            key: "reprompt-delay-ms",
            input: input.clone(),
            expected: "a whole number of milliseconds",
        })?;
        config.reprompt_delay_ms = Some(millis);
        Ok(success_set("reprompt-delay-ms", &millis.to_string()))
    }

    fn unset(&self, _arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        config.reprompt_delay_ms = None;
        Ok(format!(
            "{} (will use default: {DEFAULT_REPROMPT_DELAY_MS})",
            success_unset("reprompt-delay-ms")
        ))
    }
}
