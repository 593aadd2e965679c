use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Delay between a failed stream and the credential re-prompt.
pub const DEFAULT_REPROMPT_DELAY_MS: u64 = 1200;

/// Where provider credentials are kept between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStoreKind {
    #[default]
    Keyring,
    File,
}

impl CredentialStoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialStoreKind::Keyring => "keyring",
            CredentialStoreKind::File => "file",
        }
    }
}

impl fmt::Display for CredentialStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialStoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(CredentialStoreKind::Keyring),
            "file" => Ok(CredentialStoreKind::File),
            other => Err(format!(
                "invalid credential store '{other}' (expected 'keyring' or 'file')"
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub default_provider: Option<String>,
    #[serde(default)]
    pub default_models: HashMap<String, String>,
    /// Per-provider base URL overrides, e.g. for a local OpenAI-compatible proxy
    #[serde(default)]
    pub base_urls: HashMap<String, String>,
    pub credential_store: Option<CredentialStoreKind>,
    /// Resend the message that triggered a credential prompt once a key is saved
    pub resume_after_save: Option<bool>,
    pub reprompt_delay_ms: Option<u64>,
}

impl Config {
    pub fn get_default_model(&self, provider: &str) -> Option<&String> {
        self.default_models.get(provider)
    }

    pub fn set_default_model(&mut self, provider: String, model: String) {
        self.default_models.insert(provider, model);
    }

    pub fn unset_default_model(&mut self, provider: &str) {
        self.default_models.remove(provider);
    }

    pub fn credential_store(&self) -> CredentialStoreKind {
        self.credential_store.unwrap_or_default()
    }

    pub fn resume_after_save(&self) -> bool {
        self.resume_after_save.unwrap_or(true)
    }

    pub fn reprompt_delay(&self) -> Duration {
        Duration::from_millis(self.reprompt_delay_ms.unwrap_or(DEFAULT_REPROMPT_DELAY_MS))
    }
}

/// Render a path for user-facing messages, abbreviating the home directory.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
