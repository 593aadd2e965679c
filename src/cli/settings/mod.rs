//! Settings management for CLI set/unset commands.
//!
//! Each configuration key has a handler. Handlers are grouped by the shape of
//! the value they manage:
//!
//! - Simple settings (e.g., `default-provider`, `credential-store`)
//! - Boolean settings (e.g., `resume-after-save`)
//! - Provider-keyed settings (e.g., `default-model`, `base-url`)

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::Config;

/// Trait for handling a configuration setting.
///
/// Handlers only modify the in-memory [`Config`]; the caller persists it.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the configuration value from the arguments given after the key.
    ///
    /// Returns a success message to display.
    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError>;

    /// Clear the configuration value. `arg` names the provider for
    /// provider-keyed settings.
    fn unset(&self, arg: Option<&str>, config: &mut Config) -> Result<String, SettingError>;
}

#[cfg(test)]
mod tests;
