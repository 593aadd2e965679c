//! Credential setup outside of a chat session (`parley auth`, `parley deauth`).

use std::error::Error;

use crate::core::credentials::CredentialStore;
use crate::core::providers::{ProviderId, ProviderRegistry};

pub mod ui;

use self::ui::{
    ensure_unique, prompt_auth_menu, prompt_confirmation, prompt_provider_token,
    ConfirmationChoice, MenuSelection, ProviderMenuItem, UiError,
};

fn map_ui_result<T>(result: Result<T, UiError>) -> Result<T, Box<dyn Error>> {
    result.map_err(|err| Box::new(err) as Box<dyn Error>)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAuthStatus {
    pub id: ProviderId,
    pub display_name: String,
    pub base_url: String,
    pub model: String,
    pub has_token: bool,
}

pub struct AuthManager {
    registry: ProviderRegistry,
    store: CredentialStore,
}

impl AuthManager {
    pub fn new(registry: ProviderRegistry, store: CredentialStore) -> Self {
        Self { registry, store }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    fn display_name(&self, provider: ProviderId) -> String {
        self.registry
            .entry(provider)
            .map(|entry| entry.display_name.clone())
            .unwrap_or_else(|| provider.to_string())
    }

    pub fn get_all_providers_with_auth_status(&self) -> Vec<ProviderAuthStatus> {
        self.registry
            .entries()
            .iter()
            .map(|entry| ProviderAuthStatus {
                id: entry.id,
                display_name: entry.display_name.clone(),
                base_url: entry.base_url.clone(),
                model: entry.model.clone(),
                has_token: self.store.has(entry.id),
            })
            .collect()
    }

    pub fn store_token(&mut self, provider: ProviderId, token: &str) -> Result<(), Box<dyn Error>> {
        self.store.set(provider, token)?;
        Ok(())
    }

    /// Ask for a key, either for `provider` or for one picked from a menu.
    pub fn interactive_auth(&mut self, provider: Option<ProviderId>) -> Result<(), Box<dyn Error>> {
        let provider = match provider {
            Some(provider) => provider,
            None => {
                let menu_items: Vec<ProviderMenuItem> = self
                    .get_all_providers_with_auth_status()
                    .into_iter()
                    .map(|status| ProviderMenuItem {
                        id: status.id,
                        display_name: status.display_name,
                        configured: status.has_token,
                    })
                    .collect();
                map_ui_result(ensure_unique(&menu_items))?;

                match map_ui_result(prompt_auth_menu(&menu_items))? {
                    MenuSelection::Provider(index) => menu_items[index].id,
                    MenuSelection::Cancel => {
                        println!("Cancelled.");
                        return Ok(());
                    }
                }
            }
        };

        let display_name = self.display_name(provider);
        let token = map_ui_result(prompt_provider_token(&display_name))?;
        self.store_token(provider, &token)?;
        println!(
            "✓ API key stored for {display_name} ({})",
            self.store.describe_backend()
        );
        Ok(())
    }

    pub fn interactive_deauth(&mut self, provider: ProviderId) -> Result<(), Box<dyn Error>> {
        if !self.store.has(provider) {
            return Err(format!(
                "Provider '{provider}' has no API key stored. Use 'parley providers' to see stored keys."
            )
            .into());
        }

        let display_name = self.display_name(provider);
        let question =
            format!("Are you sure you want to remove the API key for {display_name}?");
        match map_ui_result(prompt_confirmation(&question))? {
            ConfirmationChoice::Yes => {
                self.store.clear(provider)?;
                println!("✅ API key removed for {display_name}");
            }
            ConfirmationChoice::No | ConfirmationChoice::Cancel => println!("Cancelled."),
        }
        Ok(())
    }
}
