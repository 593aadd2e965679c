//! Credential prompt flow: `Closed -> Open -> (Saved | Cancelled) -> Closed`.

use std::error::Error;
use std::fmt;

use crate::core::credentials::{CredentialError, CredentialStore};
use crate::core::providers::ProviderId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PromptState {
    #[default]
    Closed,
    Open {
        provider: ProviderId,
        /// Message to resend once a credential is saved.
        resume: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCredential {
    pub provider: ProviderId,
    pub resume: Option<String>,
}

#[derive(Debug)]
pub enum PromptError {
    NotOpen,
    Credential(CredentialError),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::NotOpen => write!(f, "No credential prompt is open"),
            PromptError::Credential(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::NotOpen => None,
            PromptError::Credential(err) => Some(err),
        }
    }
}

#[derive(Debug, Default)]
pub struct CredentialPrompt {
    state: PromptState,
}

impl CredentialPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PromptState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PromptState::Open { .. })
    }

    pub fn target(&self) -> Option<ProviderId> {
        match self.state {
            PromptState::Open { provider, .. } => Some(provider),
            PromptState::Closed => None,
        }
    }

    /// Open pre-selected to `provider`. Reopening replaces the previous target
    /// and resume message.
    pub fn open(&mut self, provider: ProviderId, resume: Option<String>) {
        self.state = PromptState::Open { provider, resume };
    }

    /// Change the target provider while open. Returns false when closed.
    pub fn retarget(&mut self, target: ProviderId) -> bool {
        match &mut self.state {
            PromptState::Open { provider, .. } => {
                *provider = target;
                true
            }
            PromptState::Closed => false,
        }
    }

    /// Write `secret` for the target provider and close.
    ///
    /// On any error the prompt stays open with its target and resume message.
    pub fn save(
        &mut self,
        store: &mut CredentialStore,
        secret: &str,
    ) -> Result<SavedCredential, PromptError> {
        let PromptState::Open { provider, .. } = self.state else {
            return Err(PromptError::NotOpen);
        };
        store
            .set(provider, secret)
            .map_err(PromptError::Credential)?;

        match std::mem::take(&mut self.state) {
            PromptState::Open { provider, resume } => Ok(SavedCredential { provider, resume }),
            PromptState::Closed => Err(PromptError::NotOpen),
        }
    }

    /// Dismiss without touching the store. Returns false when already closed.
    pub fn cancel(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = PromptState::Closed;
        was_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_preselects_provider_and_allows_retarget() {
        let mut prompt = CredentialPrompt::new();
        assert!(!prompt.retarget(ProviderId::Grok));

        prompt.open(ProviderId::OpenAi, Some("hello".into()));
        assert_eq!(prompt.target(), Some(ProviderId::OpenAi));

        assert!(prompt.retarget(ProviderId::Grok));
        assert_eq!(
            prompt.state(),
            &PromptState::Open {
                provider: ProviderId::Grok,
                resume: Some("hello".into())
            }
        );
    }

    #[test]
    fn save_writes_store_and_closes() {
        let mut store = CredentialStore::in_memory();
        let mut prompt = CredentialPrompt::new();
        prompt.open(ProviderId::Gemini, Some("hi".into()));

        let saved = prompt.save(&mut store, "g-key").unwrap();
        assert_eq!(
            saved,
            SavedCredential {
                provider: ProviderId::Gemini,
                resume: Some("hi".into())
            }
        );
        assert_eq!(store.get(ProviderId::Gemini), Some("g-key"));
        assert!(!prompt.is_open());
    }

    #[test]
    fn empty_input_keeps_prompt_open() {
        let mut store = CredentialStore::in_memory();
        let mut prompt = CredentialPrompt::new();
        prompt.open(ProviderId::OpenAi, None);

        let err = prompt.save(&mut store, "   ").unwrap_err();
        assert!(matches!(
            err,
            PromptError::Credential(CredentialError::InvalidCredential)
        ));
        assert_eq!(prompt.target(), Some(ProviderId::OpenAi));
        assert!(!store.has(ProviderId::OpenAi));
    }

    #[test]
    fn save_while_closed_fails() {
        let mut store = CredentialStore::in_memory();
        let mut prompt = CredentialPrompt::new();
        assert!(matches!(
            prompt.save(&mut store, "key"),
            Err(PromptError::NotOpen)
        ));
        assert!(!store.has(ProviderId::OpenAi));
    }

    #[test]
    fn cancel_discards_without_touching_store() {
        let mut store = CredentialStore::in_memory();
        store.set(ProviderId::Grok, "old").unwrap();
        let mut prompt = CredentialPrompt::new();
        prompt.open(ProviderId::Grok, Some("resend me".into()));

        assert!(prompt.cancel());
        assert_eq!(prompt.state(), &PromptState::Closed);
        assert_eq!(store.get(ProviderId::Grok), Some("old"));
        assert!(!prompt.cancel());
    }
}
