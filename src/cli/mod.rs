//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod provider_list;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::auth::AuthManager;
use crate::cli::provider_list::list_providers;
use crate::cli::settings::{SettingError, SettingRegistry};
use crate::core::config::Config;
use crate::core::credentials::{open_backend, CredentialStore};
use crate::core::providers::{ProviderId, ProviderRegistry};
use crate::ui::chat_loop::{run_chat, ChatOptions};

#[derive(Parser)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "A terminal chat client for OpenAI, Gemini and Grok")]
#[command(
    long_about = "Parley is a line-oriented terminal chat client that streams replies from \
hosted language-model providers.\n\n\
Authentication:\n\
  Use 'parley auth' to store an API key in your system keyring, or just start \
chatting: parley asks for a key the first time one is needed and again whenever \
a request fails.\n\n\
Commands inside a chat:\n\
  /provider <id>    Switch provider (openai, gemini, grok)\n\
  /key [id]         Enter an API key\n\
  /forget [id]      Remove a stored API key\n\
  /providers        List providers\n\
  /help             Show help\n\
  /quit             Leave the chat\n\n\
Environment Variables:\n\
  PARLEY_LOG        Log filter, e.g. 'parley=debug' (default: warn)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Provider to chat with (openai, gemini, grok)
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model to use for the starting provider
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write logs to the specified file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Keep API keys entered during this session in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Store an API key for a provider
    Auth {
        /// Provider to store a key for (prompts with a menu when omitted)
        provider: Option<String>,
    },
    /// Remove the stored API key for a provider
    Deauth {
        /// Provider whose key should be removed
        provider: String,
    },
    /// List providers and whether an API key is stored
    Providers,
    /// Set configuration values, or show them all when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
        /// Provider, for per-provider keys
        value: Option<String>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    crate::logging::init(args.log.as_deref())?;

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

fn parse_provider(input: Option<&str>) -> Result<Option<ProviderId>, Box<dyn Error>> {
    match input {
        Some(id) => Ok(Some(id.parse()?)),
        None => Ok(None),
    }
}

fn open_auth_manager(config: &Config) -> Result<AuthManager, Box<dyn Error>> {
    let store = CredentialStore::open(open_backend(config.credential_store())?)?;
    Ok(AuthManager::new(ProviderRegistry::from_config(config), store))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            run_chat(ChatOptions {
                provider: parse_provider(args.provider.as_deref())?,
                model: args.model,
                ephemeral: args.ephemeral,
            })
            .await
        }
        Commands::Auth { provider } => {
            let config = Config::load()?;
            let provider = parse_provider(provider.as_deref().or(args.provider.as_deref()))?;
            let mut auth_manager = open_auth_manager(&config)?;
            if let Err(e) = auth_manager.interactive_auth(provider) {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth { provider } => {
            let config = Config::load()?;
            let provider: ProviderId = provider.parse()?;
            let mut auth_manager = open_auth_manager(&config)?;
            if let Err(e) = auth_manager.interactive_deauth(provider) {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Providers => {
            let config = Config::load()?;
            let auth_manager = open_auth_manager(&config)?;
            list_providers(&auth_manager, config.default_provider.as_deref())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(key) = key else {
                config.print_all();
                return Ok(());
            };
            let result = SettingRegistry::new()
                .get(&key)
                .ok_or_else(|| SettingError::UnknownKey(key.clone()))
                .and_then(|handler| handler.set(&value, &mut config));
            finish_setting(result, &config)
        }
        Commands::Unset { key, value } => {
            let mut config = Config::load()?;
            let result = SettingRegistry::new()
                .get(&key)
                .ok_or_else(|| SettingError::UnknownKey(key.clone()))
                .and_then(|handler| handler.unset(value.as_deref(), &mut config));
            finish_setting(result, &config)
        }
    }
}

fn finish_setting(result: Result<String, SettingError>, config: &Config) -> Result<(), Box<dyn Error>> {
    let saved = result.and_then(|message| {
        config
            .save()
            .map(|()| message)
            .map_err(|e| SettingError::ConfigError(e.to_string()))
    });
    match saved {
        Ok(message) => {
            debug!(path = ?Config::get_config_path().ok(), "Configuration saved");
            println!("{message}");
            Ok(())
        }
        Err(err) => {
            err.print();
            std::process::exit(1);
        }
    }
}
