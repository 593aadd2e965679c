//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    base_url_handler, default_model_handler, resume_after_save_handler, CredentialStoreHandler,
    DefaultProviderHandler, RepromptDelayHandler,
};
use super::SettingHandler;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
}

impl SettingRegistry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };

        registry.register(Box::new(DefaultProviderHandler));
        registry.register(Box::new(CredentialStoreHandler));
        registry.register(Box::new(resume_after_save_handler()));
        registry.register(Box::new(RepromptDelayHandler));
        registry.register(Box::new(default_model_handler()));
        registry.register(Box::new(base_url_handler()));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        self.handlers.insert(handler.key(), handler);
    }

    /// Get a handler by key.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Get all keys in sorted order.
    pub fn keys_sorted(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.handlers.keys().copied().collect();
        keys.sort();
        keys
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
