//! Per-provider credential storage.
//!
//! The [`CredentialStore`] loads every provider's secret once when it opens
//! and mirrors each save/clear to its [`SecretBackend`] before returning.
//! Secrets are never validated locally; a bad key is only discovered when a
//! provider call fails.

use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use keyring::Entry;
use tracing::{debug, warn};

use crate::core::config::data::{path_display, CredentialStoreKind};
use crate::core::config::io::{config_dir, write_atomically, ConfigError};
use crate::core::keyring::KeyringAccessError;
use crate::core::providers::ProviderId;

const KEYRING_SERVICE: &str = "parley";
const CREDENTIALS_FILE: &str = "credentials.toml";

#[derive(Debug)]
pub enum CredentialError {
    /// The secret was empty or whitespace-only.
    InvalidCredential,
    Keyring(KeyringAccessError),
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Serialize(toml::ser::Error),
    Config(ConfigError),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::InvalidCredential => write!(f, "API key cannot be empty"),
            CredentialError::Keyring(err) => write!(f, "Keyring error: {err}"),
            CredentialError::Io { path, source } => {
                write!(f, "Failed to access {}: {}", path_display(path), source)
            }
            CredentialError::Parse { path, source } => {
                write!(f, "Failed to parse {}: {}", path_display(path), source)
            }
            CredentialError::Serialize(err) => write!(f, "Failed to serialize credentials: {err}"),
            CredentialError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CredentialError::InvalidCredential => None,
            CredentialError::Keyring(err) => Some(err),
            CredentialError::Io { source, .. } => Some(source),
            CredentialError::Parse { source, .. } => Some(source),
            CredentialError::Serialize(err) => Some(err),
            CredentialError::Config(err) => Some(err),
        }
    }
}

impl From<KeyringAccessError> for CredentialError {
    fn from(err: KeyringAccessError) -> Self {
        CredentialError::Keyring(err)
    }
}

impl From<ConfigError> for CredentialError {
    fn from(err: ConfigError) -> Self {
        CredentialError::Config(err)
    }
}

/// Durable key/value storage for secrets, keyed by
/// [`ProviderId::storage_key`].
pub trait SecretBackend: Send {
    fn load(&self, key: &str) -> Result<Option<String>, CredentialError>;
    fn store(&mut self, key: &str, secret: &str) -> Result<(), CredentialError>;
    fn remove(&mut self, key: &str) -> Result<(), CredentialError>;
    fn describe(&self) -> String;
}

/// The platform keyring (Keychain, Secret Service, Credential Manager).
#[derive(Debug, Clone)]
pub struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, CredentialError> {
        Entry::new(&self.service, key).map_err(|err| KeyringAccessError::from(err).into())
    }
}

impl Default for KeyringBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretBackend for KeyringBackend {
    fn load(&self, key: &str) -> Result<Option<String>, CredentialError> {
        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(KeyringAccessError::from(err).into()),
        }
    }

    fn store(&mut self, key: &str, secret: &str) -> Result<(), CredentialError> {
        self.entry(key)?
            .set_password(secret)
            .map_err(|err| KeyringAccessError::from(err).into())
    }

    fn remove(&mut self, key: &str) -> Result<(), CredentialError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(KeyringAccessError::from(err).into()),
        }
    }

    fn describe(&self) -> String {
        format!("system keyring (service '{}')", self.service)
    }
}

/// A TOML file with one `credential_<provider> = "<secret>"` line per
/// provider. The file is rewritten atomically on every change.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileBackend {
    /// `credentials.toml` next to the user config.
    pub fn default_location() -> Result<Self, CredentialError> {
        Self::open(config_dir()?.join(CREDENTIALS_FILE))
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| CredentialError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| CredentialError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), CredentialError> {
        let contents = toml::to_string(&self.values).map_err(CredentialError::Serialize)?;
        // NamedTempFile is created 0600 on Unix and persist keeps the mode.
        write_atomically(&self.path, contents.as_bytes()).map_err(|source| CredentialError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl SecretBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.values.get(key).cloned())
    }

    fn store(&mut self, key: &str, secret: &str) -> Result<(), CredentialError> {
        let previous = self.values.insert(key.to_string(), secret.to_string());
        if let Err(err) = self.flush() {
            match previous {
                Some(value) => self.values.insert(key.to_string(), value),
                None => self.values.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CredentialError> {
        let Some(previous) = self.values.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.flush() {
            self.values.insert(key.to_string(), previous);
            return Err(err);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", path_display(&self.path))
    }
}

/// Process-local storage. Clones share the same map, so a second store opened
/// on a clone sees what the first one saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds consistent String values.
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SecretBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.values().get(key).cloned())
    }

    fn store(&mut self, key: &str, secret: &str) -> Result<(), CredentialError> {
        self.values().insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CredentialError> {
        self.values().remove(key);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}

/// Open the backend selected in the user config.
pub fn open_backend(kind: CredentialStoreKind) -> Result<Box<dyn SecretBackend>, CredentialError> {
    Ok(match kind {
        CredentialStoreKind::Keyring => Box::new(KeyringBackend::new()),
        CredentialStoreKind::File => Box::new(FileBackend::default_location()?),
    })
}

pub struct CredentialStore {
    backend: Box<dyn SecretBackend>,
    credentials: HashMap<ProviderId, String>,
}

impl CredentialStore {
    /// Load the credential set from `backend`.
    ///
    /// A keyring that is temporarily unreachable is treated as empty so the
    /// session can still start and prompt for keys.
    pub fn open(backend: Box<dyn SecretBackend>) -> Result<Self, CredentialError> {
        let mut credentials = HashMap::new();
        for provider in ProviderId::ALL {
            match backend.load(&provider.storage_key()) {
                Ok(Some(secret)) if !secret.trim().is_empty() => {
                    credentials.insert(provider, secret);
                }
                Ok(_) => {}
                Err(CredentialError::Keyring(err)) if err.is_recoverable() => {
                    warn!(provider = %provider, error = %err, "Keyring unavailable; treating credential as absent");
                }
                Err(err) => return Err(err),
            }
        }
        debug!(
            backend = %backend.describe(),
            loaded = credentials.len(),
            "Credential store opened"
        );
        Ok(Self {
            backend,
            credentials,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryBackend::new()),
            credentials: HashMap::new(),
        }
    }

    pub fn get(&self, provider: ProviderId) -> Option<&str> {
        self.credentials.get(&provider).map(String::as_str)
    }

    pub fn has(&self, provider: ProviderId) -> bool {
        self.credentials.contains_key(&provider)
    }

    pub fn set(&mut self, provider: ProviderId, secret: &str) -> Result<(), CredentialError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(CredentialError::InvalidCredential);
        }
        self.backend.store(&provider.storage_key(), secret)?;
        self.credentials.insert(provider, secret.to_string());
        debug!(provider = %provider, "Credential saved");
        Ok(())
    }

    pub fn clear(&mut self, provider: ProviderId) -> Result<(), CredentialError> {
        self.backend.remove(&provider.storage_key())?;
        self.credentials.remove(&provider);
        debug!(provider = %provider, "Credential cleared");
        Ok(())
    }

    pub fn describe_backend(&self) -> String {
        self.backend.describe()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut configured: Vec<_> = self.credentials.keys().collect();
        configured.sort();
        f.debug_struct("CredentialStore")
            .field("backend", &self.backend.describe())
            .field("configured", &configured)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory_store() -> (CredentialStore, MemoryBackend) {
        let backend = MemoryBackend::new();
        let store = CredentialStore::open(Box::new(backend.clone())).unwrap();
        (store, backend)
    }

    #[test]
    fn set_then_get_returns_exact_secret() {
        let (mut store, _) = memory_store();
        store.set(ProviderId::OpenAi, "sk-abc").unwrap();
        assert_eq!(store.get(ProviderId::OpenAi), Some("sk-abc"));
        assert_eq!(store.get(ProviderId::Gemini), None);
    }

    #[test]
    fn empty_or_whitespace_secret_is_rejected_and_keeps_prior_value() {
        let (mut store, backend) = memory_store();
        store.set(ProviderId::Grok, "xai-1").unwrap();

        for bad in ["", "   ", "\t\n"] {
            let err = store.set(ProviderId::Grok, bad).unwrap_err();
            assert!(matches!(err, CredentialError::InvalidCredential));
        }

        assert_eq!(store.get(ProviderId::Grok), Some("xai-1"));
        assert_eq!(
            backend.load("credential_grok").unwrap().as_deref(),
            Some("xai-1")
        );
    }

    #[test]
    fn writes_survive_reopening_the_store() {
        let (mut store, backend) = memory_store();
        store.set(ProviderId::Gemini, "g-key").unwrap();
        store.set(ProviderId::OpenAi, "o-key").unwrap();
        store.clear(ProviderId::OpenAi).unwrap();

        let reopened = CredentialStore::open(Box::new(backend)).unwrap();
        assert_eq!(reopened.get(ProviderId::Gemini), Some("g-key"));
        assert_eq!(reopened.get(ProviderId::OpenAi), None);
    }

    #[test]
    fn clear_of_absent_credential_is_a_no_op() {
        let (mut store, _) = memory_store();
        store.clear(ProviderId::Grok).unwrap();
        assert!(!store.has(ProviderId::Grok));
    }

    #[test]
    fn empty_values_in_storage_load_as_absent() {
        let mut backend = MemoryBackend::new();
        backend.store("credential_openai", "  ").unwrap();
        let store = CredentialStore::open(Box::new(backend)).unwrap();
        assert_eq!(store.get(ProviderId::OpenAi), None);
    }

    #[test]
    fn file_backend_uses_one_key_per_provider() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.toml");

        let mut store =
            CredentialStore::open(Box::new(FileBackend::open(&path).unwrap())).unwrap();
        store.set(ProviderId::OpenAi, "sk-file").unwrap();
        store.set(ProviderId::Grok, "xai-file").unwrap();
        store.clear(ProviderId::Grok).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("credential_openai = \"sk-file\""));
        assert!(!contents.contains("credential_grok"));

        let reopened =
            CredentialStore::open(Box::new(FileBackend::open(&path).unwrap())).unwrap();
        assert_eq!(reopened.get(ProviderId::OpenAi), Some("sk-file"));
    }

    #[cfg(unix)]
    #[test]
    fn file_backend_keeps_secrets_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.toml");
        let mut backend = FileBackend::open(&path).unwrap();
        backend.store("credential_gemini", "secret").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn file_backend_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.toml");
        std::fs::write(&path, "credential_openai = ").unwrap();

        let err = FileBackend::open(&path).unwrap_err();
        assert!(matches!(err, CredentialError::Parse { .. }));
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let (mut store, _) = memory_store();
        store.set(ProviderId::OpenAi, "sk-hidden").unwrap();
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("sk-hidden"));
        assert!(rendered.contains("OpenAi"));
    }
}
