//! Provider registry
//!
//! Maps each [`ProviderId`] to the endpoint family, base URL and model used
//! to talk to it. Entries come from the embedded `builtin_providers.toml` and
//! may be overridden from the user config. Resolving a handle never touches
//! the network.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::core::config::Config;

const STORAGE_KEY_PREFIX: &str = "credential_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Gemini,
    Grok,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::OpenAi, ProviderId::Gemini, ProviderId::Grok];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Gemini => "gemini",
            ProviderId::Grok => "grok",
        }
    }

    /// Key under which this provider's credential is stored.
    pub fn storage_key(self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ProviderError::Unsupported(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointFamily {
    /// `POST {base}/chat/completions` with bearer auth and SSE deltas.
    #[serde(rename = "openai")]
    OpenAiCompatible,
    /// `POST {base}/models/{model}:streamGenerateContent?alt=sse`.
    #[serde(rename = "gemini")]
    Gemini,
}

#[derive(Debug)]
pub enum ProviderError {
    Unsupported(String),
    InvalidBaseUrl { provider: ProviderId, url: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Unsupported(id) => write!(
                f,
                "Unsupported provider '{id}'. Supported providers: openai, gemini, grok"
            ),
            ProviderError::InvalidBaseUrl { provider, url } => {
                write!(f, "Invalid base URL for {provider}: {url}")
            }
        }
    }
}

impl Error for ProviderError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub id: ProviderId,
    pub display_name: String,
    pub family: EndpointFamily,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct BuiltinProvidersConfig {
    providers: Vec<ProviderEntry>,
}

/// Load built-in providers from the embedded configuration
pub fn load_builtin_providers() -> Vec<ProviderEntry> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_providers.toml");

    let config: BuiltinProvidersConfig =
        toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_providers.toml");

    config.providers
}

/// A callable model: everything a transport needs to open a stream.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelHandle {
    pub provider: ProviderId,
    pub family: EndpointFamily,
    pub base_url: String,
    pub model: String,
    pub secret: String,
}

impl ModelHandle {
    /// Streaming endpoint for this handle. The model name is a single path
    /// segment, so reserved characters in it are percent-encoded.
    pub fn stream_url(&self) -> Result<Url, ProviderError> {
        let invalid = || ProviderError::InvalidBaseUrl {
            provider: self.provider,
            url: self.base_url.clone(),
        };
        let mut url = Url::parse(&normalize_base_url(&self.base_url)).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments.pop_if_empty();
            match self.family {
                EndpointFamily::OpenAiCompatible => {
                    segments.extend(["chat", "completions"]);
                }
                EndpointFamily::Gemini => {
                    segments.push("models");
                    segments.push(&format!("{}:streamGenerateContent", self.model));
                }
            }
        }
        if self.family == EndpointFamily::Gemini {
            url.query_pairs_mut().append_pair("alt", "sse");
        }
        Ok(url)
    }
}

/// Strip trailing slashes so endpoint paths join with exactly one separator.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("provider", &self.provider)
            .field("family", &self.family)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    pub fn builtin() -> Self {
        Self::with_entries(load_builtin_providers())
    }

    pub fn with_entries(entries: Vec<ProviderEntry>) -> Self {
        Self { entries }
    }

    /// Built-in entries with the model and base URL overrides from `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::builtin();
        for entry in &mut registry.entries {
            if let Some(model) = config.get_default_model(entry.id.as_str()) {
                entry.model = model.clone();
            }
            if let Some(base_url) = config.base_urls.get(entry.id.as_str()) {
                entry.base_url = normalize_base_url(base_url);
            }
        }
        registry
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    pub fn entry(&self, provider: ProviderId) -> Option<&ProviderEntry> {
        self.entries.iter().find(|entry| entry.id == provider)
    }

    /// Override the model used for `provider` for the rest of the session.
    pub fn set_model(&mut self, provider: ProviderId, model: String) -> Result<(), ProviderError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == provider)
            .ok_or_else(|| ProviderError::Unsupported(provider.to_string()))?;
        entry.model = model;
        Ok(())
    }

    pub fn resolve(&self, provider: ProviderId, secret: &str) -> Result<ModelHandle, ProviderError> {
        let entry = self
            .entry(provider)
            .ok_or_else(|| ProviderError::Unsupported(provider.to_string()))?;
        Ok(ModelHandle {
            provider,
            family: entry.family,
            base_url: normalize_base_url(&entry.base_url),
            model: entry.model.clone(),
            secret: secret.to_string(),
        })
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_every_provider() {
        let providers = load_builtin_providers();
        for id in ProviderId::ALL {
            let entry = providers
                .iter()
                .find(|entry| entry.id == id)
                .unwrap_or_else(|| panic!("missing builtin entry for {id}"));
            assert!(!entry.display_name.is_empty());
            assert!(!entry.model.is_empty());
            assert!(entry.base_url.starts_with("https://"));
        }
    }

    #[test]
    fn provider_ids_parse_case_insensitively() {
        assert_eq!("OpenAI".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert_eq!(" grok ".parse::<ProviderId>().unwrap(), ProviderId::Grok);
        let err = "anthropic".parse::<ProviderId>().unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported(ref id) if id == "anthropic"));
    }

    #[test]
    fn storage_keys_are_derived_from_the_id() {
        assert_eq!(ProviderId::OpenAi.storage_key(), "credential_openai");
        assert_eq!(ProviderId::Gemini.storage_key(), "credential_gemini");
        assert_eq!(ProviderId::Grok.storage_key(), "credential_grok");
    }

    #[test]
    fn resolve_builds_handles_per_family() {
        let registry = ProviderRegistry::builtin();

        let openai = registry.resolve(ProviderId::OpenAi, "sk-1").unwrap();
        assert_eq!(openai.family, EndpointFamily::OpenAiCompatible);
        assert_eq!(
            openai.stream_url().unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(openai.secret, "sk-1");

        let grok = registry.resolve(ProviderId::Grok, "xai").unwrap();
        assert_eq!(
            grok.stream_url().unwrap().as_str(),
            "https://api.x.ai/v1/chat/completions"
        );

        let gemini = registry.resolve(ProviderId::Gemini, "g").unwrap();
        assert_eq!(gemini.family, EndpointFamily::Gemini);
        assert_eq!(
            gemini.stream_url().unwrap().as_str(),
            format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:streamGenerateContent?alt=sse",
                gemini.model
            )
        );
    }

    #[test]
    fn resolve_fails_for_providers_without_an_entry() {
        let registry = ProviderRegistry::with_entries(Vec::new());
        let err = registry.resolve(ProviderId::Grok, "key").unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported(ref id) if id == "grok"));
    }

    #[test]
    fn from_config_applies_model_and_url_overrides() {
        let mut config = Config::default();
        config.set_default_model("gemini".into(), "gemini-2.0-pro".into());
        config
            .base_urls
            .insert("openai".into(), "http://localhost:8080/v1/".into());

        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(registry.entry(ProviderId::Gemini).unwrap().model, "gemini-2.0-pro");
        assert_eq!(
            registry
                .resolve(ProviderId::OpenAi, "k")
                .unwrap()
                .stream_url()
                .unwrap()
                .as_str(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn base_urls_lose_trailing_slashes() {
        assert_eq!(normalize_base_url("https://api.x.ai/v1"), "https://api.x.ai/v1");
        assert_eq!(normalize_base_url("https://api.x.ai/v1///"), "https://api.x.ai/v1");
        assert_eq!(normalize_base_url(" http://localhost:8080/ "), "http://localhost:8080");
    }

    #[test]
    fn gemini_model_names_are_encoded_as_one_segment() {
        let mut registry = ProviderRegistry::builtin();
        registry
            .set_model(ProviderId::Gemini, "tuned/model?x=1#frag".into())
            .unwrap();
        let url = registry
            .resolve(ProviderId::Gemini, "g")
            .unwrap()
            .stream_url()
            .unwrap();

        assert_eq!(
            url.path(),
            "/v1beta/models/tuned%2Fmodel%3Fx=1%23frag:streamGenerateContent"
        );
        assert_eq!(url.query(), Some("alt=sse"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn unparseable_base_url_is_reported() {
        let mut entries = load_builtin_providers();
        for entry in &mut entries {
            entry.base_url = "not a url".into();
        }
        let handle = ProviderRegistry::with_entries(entries)
            .resolve(ProviderId::OpenAi, "k")
            .unwrap();
        assert!(matches!(
            handle.stream_url(),
            Err(ProviderError::InvalidBaseUrl {
                provider: ProviderId::OpenAi,
                ..
            })
        ));
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let handle = ProviderRegistry::builtin()
            .resolve(ProviderId::OpenAi, "sk-very-secret")
            .unwrap();
        let rendered = format!("{handle:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
