use std::error::Error;

use crate::auth::{AuthManager, ProviderAuthStatus};

pub fn list_providers(
    auth_manager: &AuthManager,
    default_provider: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let providers = auth_manager.get_all_providers_with_auth_status();
    print!("{}", format_provider_table(&providers, default_provider));
    Ok(())
}

pub fn format_provider_table(
    providers: &[ProviderAuthStatus],
    default_provider: Option<&str>,
) -> String {
    if providers.is_empty() {
        return "No providers available.\n".to_string();
    }

    let mut content = String::from("Available Providers:\n\n");
    content.push_str(&format!(
        "  {:<9} {:<16} {:<22} {:<52} {}\n",
        "Provider", "Display Name", "Model", "URL", "Key"
    ));

    for ProviderAuthStatus {
        id,
        display_name,
        base_url,
        model,
        has_token,
    } in providers
    {
        let auth_status = if *has_token { "✅" } else { "❌" };
        let provider_id = if default_provider.is_some_and(|d| d.eq_ignore_ascii_case(id.as_str())) {
            format!("{id}*")
        } else {
            id.to_string()
        };

        content.push_str(&format!(
            "  {provider_id:<9} {display_name:<16} {model:<22} {base_url:<52} {auth_status}\n"
        ));
    }

    if default_provider.is_some() {
        content.push_str("\n* = default provider\n");
    }
    content
}
