//! Line input interpretation.
//!
//! The same line means different things depending on whether the credential
//! prompt is open: while it is, anything that is not a prompt command is the
//! secret being entered.

use crate::core::actions::SessionAction;
use crate::core::providers::ProviderId;

#[derive(Debug)]
pub enum InputIntent {
    Action(SessionAction),
    ListProviders,
    Help,
    Quit,
    /// Nothing to do, e.g. a blank line with no prompt open.
    Ignore,
    /// The line could not be understood; the string says why.
    Invalid(String),
}

pub const HELP_TEXT: &str = "\
Commands:
  /provider <id>   Switch provider (openai, gemini, grok)
  /key [id]        Enter an API key for a provider
  /forget [id]     Remove the stored API key for a provider
  /providers       List providers and whether a key is stored
  /help            Show this help
  /quit            Leave the chat

While entering a key:
  /provider <id>   Save the key for another provider instead
  /cancel          Discard the prompt (an empty line does the same)";

pub fn parse_line(line: &str, prompt_open: bool) -> InputIntent {
    let trimmed = line.trim();
    if prompt_open {
        parse_prompt_line(trimmed)
    } else {
        parse_chat_line(line, trimmed)
    }
}

fn parse_prompt_line(trimmed: &str) -> InputIntent {
    if trimmed.is_empty() {
        return InputIntent::Action(SessionAction::CancelCredentialPrompt);
    }
    let (command, arg) = split_command(trimmed);
    match command {
        Some("cancel") => InputIntent::Action(SessionAction::CancelCredentialPrompt),
        Some("quit") => InputIntent::Quit,
        Some("provider") => match parse_provider_arg(arg) {
            Ok(Some(provider)) => InputIntent::Action(SessionAction::RetargetPrompt { provider }),
            Ok(None) => InputIntent::Invalid("Usage: /provider <id>".to_string()),
            Err(message) => InputIntent::Invalid(message),
        },
        _ => InputIntent::Action(SessionAction::SaveCredential {
            provider: None,
            secret: trimmed.to_string(),
        }),
    }
}

fn parse_chat_line(line: &str, trimmed: &str) -> InputIntent {
    if trimmed.is_empty() {
        return InputIntent::Ignore;
    }
    let (command, arg) = split_command(trimmed);
    let Some(command) = command else {
        return InputIntent::Action(SessionAction::Submit {
            text: line.trim_end_matches(['\r', '\n']).to_string(),
        });
    };

    match command {
        "provider" => match parse_provider_arg(arg) {
            Ok(Some(provider)) => InputIntent::Action(SessionAction::SelectProvider { provider }),
            Ok(None) => InputIntent::Invalid("Usage: /provider <id>".to_string()),
            Err(message) => InputIntent::Invalid(message),
        },
        "key" => match parse_provider_arg(arg) {
            Ok(provider) => InputIntent::Action(SessionAction::OpenCredentialPrompt { provider }),
            Err(message) => InputIntent::Invalid(message),
        },
        "forget" => match parse_provider_arg(arg) {
            Ok(provider) => InputIntent::Action(SessionAction::ForgetCredential { provider }),
            Err(message) => InputIntent::Invalid(message),
        },
        "providers" => InputIntent::ListProviders,
        "help" => InputIntent::Help,
        "quit" | "exit" => InputIntent::Quit,
        other => InputIntent::Invalid(format!("Unknown command: /{other}. Type /help for help.")),
    }
}

/// Split `/name rest` into `(Some("name"), "rest")`; plain text yields `None`.
fn split_command(trimmed: &str) -> (Option<&str>, &str) {
    let Some(body) = trimmed.strip_prefix('/') else {
        return (None, "");
    };
    match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (Some(name), rest.trim()),
        None => (Some(body), ""),
    }
}

fn parse_provider_arg(arg: &str) -> Result<Option<ProviderId>, String> {
    if arg.is_empty() {
        return Ok(None);
    }
    arg.parse::<ProviderId>()
        .map(Some)
        .map_err(|err| err.to_string())
}
