use std::collections::HashSet;
use std::fmt;
use std::io::{self, BufRead, Write};

use crate::core::providers::ProviderId;

const TOKEN_PROMPT: &str = "Enter your API key (leave empty to cancel): ";
const INVALID_CHOICE_MSG: &str = "Invalid choice";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMenuItem {
    pub id: ProviderId,
    pub display_name: String,
    pub configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuSelection {
    Provider(usize),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationChoice {
    Yes,
    No,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct UiError {
    message: String,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UiError {}

impl From<io::Error> for UiError {
    fn from(err: io::Error) -> Self {
        UiError::new(err.to_string())
    }
}

fn read_answer(prompt: &str) -> Result<String, UiError> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input)
}

pub fn prompt_auth_menu(providers: &[ProviderMenuItem]) -> Result<MenuSelection, UiError> {
    println!("🔐 Parley Authentication Setup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    println!("Available providers:");
    for (index, provider) in providers.iter().enumerate() {
        let status = if provider.configured {
            "✓ configured"
        } else {
            "not configured"
        };
        println!(
            "  {}. {} ({}) - {}",
            index + 1,
            provider.display_name,
            provider.id,
            status
        );
    }
    println!("  {}. Cancel", providers.len() + 1);
    println!();

    let input = read_answer(&format!("Select a provider (1-{}): ", providers.len() + 1))?;
    parse_provider_selection(&input, providers.len(), true)
}

pub fn prompt_provider_token(display_name: &str) -> Result<String, UiError> {
    println!();
    println!("Selected provider: {display_name}");
    let token = read_answer(TOKEN_PROMPT)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(UiError::new("Token cannot be empty"));
    }
    Ok(token.to_string())
}

pub fn prompt_confirmation(question: &str) -> Result<ConfirmationChoice, UiError> {
    let answer = read_answer(&format!("{question} (y/N): "))?;
    parse_confirmation(&answer)
}

pub fn parse_confirmation(input: &str) -> Result<ConfirmationChoice, UiError> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return Ok(ConfirmationChoice::No);
    }
    match trimmed.as_str() {
        "y" | "yes" => Ok(ConfirmationChoice::Yes),
        "n" | "no" => Ok(ConfirmationChoice::No),
        "c" | "cancel" => Ok(ConfirmationChoice::Cancel),
        _ => Err(UiError::new("Invalid confirmation response")),
    }
}

/// Parse a 1-based menu choice over `count` providers, with an optional
/// trailing cancel entry.
pub fn parse_provider_selection(
    input: &str,
    count: usize,
    include_cancel: bool,
) -> Result<MenuSelection, UiError> {
    if count == 0 {
        return Err(UiError::new(INVALID_CHOICE_MSG));
    }

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UiError::new("Selection cannot be empty"));
    }

    let choice: usize = trimmed
        .parse()
        .map_err(|_| UiError::new(INVALID_CHOICE_MSG))?;

    let max_choice = count + usize::from(include_cancel);
    if choice == 0 || choice > max_choice {
        return Err(UiError::new(INVALID_CHOICE_MSG));
    }

    if include_cancel && choice == count + 1 {
        return Ok(MenuSelection::Cancel);
    }

    Ok(MenuSelection::Provider(choice - 1))
}

/// Menu entries must name distinct providers.
pub fn ensure_unique(providers: &[ProviderMenuItem]) -> Result<(), UiError> {
    let mut seen = HashSet::new();
    for provider in providers {
        if !seen.insert(provider.id) {
            return Err(UiError::new("Duplicate provider entries are not allowed"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_parsing_handles_empty_and_cancel() {
        assert_eq!(parse_confirmation(" ").unwrap(), ConfirmationChoice::No);
        assert_eq!(parse_confirmation("Yes").unwrap(), ConfirmationChoice::Yes);
        assert_eq!(
            parse_confirmation("cancel").unwrap(),
            ConfirmationChoice::Cancel
        );
        assert!(parse_confirmation("maybe").is_err());
    }

    #[test]
    fn provider_selection_handles_cancel_option() {
        assert_eq!(
            parse_provider_selection("4", 3, true).unwrap(),
            MenuSelection::Cancel
        );
        assert_eq!(
            parse_provider_selection(" 2 ", 3, true).unwrap(),
            MenuSelection::Provider(1)
        );
        assert!(parse_provider_selection("4", 3, false).is_err());
    }

    #[test]
    fn provider_selection_rejects_out_of_range_and_garbage() {
        assert!(parse_provider_selection("0", 3, true).is_err());
        assert!(parse_provider_selection("", 3, true).is_err());
        assert!(parse_provider_selection("two", 3, true).is_err());
        assert!(parse_provider_selection("1", 0, true).is_err());
    }

    #[test]
    fn duplicate_menu_entries_are_rejected() {
        let item = ProviderMenuItem {
            id: ProviderId::OpenAi,
            display_name: "OpenAI".into(),
            configured: false,
        };
        assert!(ensure_unique(&[item.clone()]).is_ok());
        assert!(ensure_unique(&[item.clone(), item]).is_err());
    }
}
