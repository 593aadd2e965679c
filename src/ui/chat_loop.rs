//! Main chat event loop
//!
//! Reads lines from stdin and multiplexes them with stream messages, delayed
//! actions and session events. All session state lives in the
//! [`SessionController`]; the loop only routes input and executes the
//! commands the controller hands back.

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::core::actions::{apply_action, SessionAction, SessionActionDispatcher};
use crate::core::chat_stream::{ChatStreamService, HttpTransport};
use crate::core::config::Config;
use crate::core::credentials::{open_backend, CredentialStore};
use crate::core::providers::{ProviderId, ProviderRegistry};
use crate::core::session::{SessionCommand, SessionController, SessionOptions};
use crate::ui::input::{parse_line, InputIntent, HELP_TEXT};
use crate::ui::renderer::Renderer;

#[derive(Debug, Default, Clone)]
pub struct ChatOptions {
    pub provider: Option<ProviderId>,
    /// Model override for the starting provider.
    pub model: Option<String>,
    /// Keep credentials in memory only for this session.
    pub ephemeral: bool,
}

/// Executes controller commands against the stream service and dispatcher.
pub struct CommandExecutor {
    streams: ChatStreamService,
    dispatcher: SessionActionDispatcher,
}

impl CommandExecutor {
    pub fn new(streams: ChatStreamService, dispatcher: SessionActionDispatcher) -> Self {
        Self {
            streams,
            dispatcher,
        }
    }

    pub fn execute(&self, command: SessionCommand) {
        match command {
            SessionCommand::SpawnStream(params) => self.streams.spawn_stream(params),
            SessionCommand::SchedulePrompt { provider, delay } => {
                debug!(provider = %provider, delay_ms = delay.as_millis() as u64, "Scheduling credential prompt");
                self.dispatcher
                    .dispatch_after(delay, SessionAction::PromptDue { provider });
            }
        }
    }
}

pub async fn run_chat(options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let mut registry = ProviderRegistry::from_config(&config);

    let provider = match options.provider {
        Some(provider) => provider,
        None => match config.default_provider.as_deref() {
            Some(id) => id.parse()?,
            None => ProviderId::OpenAi,
        },
    };
    if let Some(model) = options.model {
        registry.set_model(provider, model)?;
    }

    let credentials = if options.ephemeral {
        CredentialStore::in_memory()
    } else {
        CredentialStore::open(open_backend(config.credential_store())?)?
    };
    info!(
        provider = %provider,
        backend = %credentials.describe_backend(),
        "Starting chat session"
    );

    let (mut session, mut events) = SessionController::new(
        credentials,
        registry,
        provider,
        SessionOptions::from_config(&config),
    );

    let transport = Arc::new(HttpTransport::new(reqwest::Client::new()));
    let (streams, mut stream_rx) = ChatStreamService::new(transport);
    let (dispatcher, mut action_rx) = SessionActionDispatcher::channel();
    let executor = CommandExecutor::new(streams, dispatcher);

    let mut renderer = Renderer::new(io::stdout());
    print_banner(&mut renderer, &session)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    break;
                };
                match parse_line(&line, session.prompt().is_open()) {
                    InputIntent::Action(action) => {
                        if let Some(command) = apply_action(&mut session, action) {
                            executor.execute(command);
                        }
                    }
                    InputIntent::ListProviders => renderer.providers(
                        session.registry(),
                        session.credentials(),
                        session.active_provider(),
                    )?,
                    InputIntent::Help => renderer.notice(HELP_TEXT)?,
                    InputIntent::Quit => break,
                    InputIntent::Ignore => {}
                    InputIntent::Invalid(message) => renderer.notice(&message)?,
                }
            }
            Some((message, stream_id)) = stream_rx.recv() => {
                if let Some(command) =
                    apply_action(&mut session, SessionAction::Stream { message, stream_id })
                {
                    executor.execute(command);
                }
            }
            Some(action) = action_rx.recv() => {
                if let Some(command) = apply_action(&mut session, action) {
                    executor.execute(command);
                }
            }
            Some(event) = events.recv() => {
                renderer.render(&event)?;
            }
        }
    }

    session.shutdown();
    while let Ok(event) = events.try_recv() {
        renderer.render(&event)?;
    }
    Ok(())
}

fn print_banner<W: Write>(
    renderer: &mut Renderer<W>,
    session: &SessionController,
) -> io::Result<()> {
    let provider = session.active_provider();
    let model = session
        .registry()
        .entry(provider)
        .map(|entry| entry.model.as_str())
        .unwrap_or("unknown");
    renderer.notice(&format!(
        "parley v{} - {provider} ({model}). Type /help for commands.",
        env!("CARGO_PKG_VERSION")
    ))?;
    if !session.credentials().has(provider) {
        renderer.notice(&format!(
            "No API key stored for {provider}. Send a message or use /key to add one."
        ))?;
    }
    Ok(())
}
