use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::chat_stream::StreamMessage;
use crate::core::providers::ProviderId;
use crate::core::session::{SessionCommand, SessionController, SubmitOutcome};

#[derive(Debug)]
pub enum SessionAction {
    Submit {
        text: String,
    },
    SelectProvider {
        provider: ProviderId,
    },
    /// Open the prompt for `provider`, or the active provider.
    OpenCredentialPrompt {
        provider: Option<ProviderId>,
    },
    RetargetPrompt {
        provider: ProviderId,
    },
    SaveCredential {
        provider: Option<ProviderId>,
        secret: String,
    },
    CancelCredentialPrompt,
    ForgetCredential {
        provider: Option<ProviderId>,
    },
    /// The re-prompt delay after a failed send elapsed.
    PromptDue {
        provider: ProviderId,
    },
    Stream {
        message: StreamMessage,
        stream_id: u64,
    },
}

/// Feeds actions back into the event loop, optionally after a delay.
#[derive(Clone)]
pub struct SessionActionDispatcher {
    tx: mpsc::UnboundedSender<SessionAction>,
}

impl SessionActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<SessionAction>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn dispatch(&self, action: SessionAction) {
        let _ = self.tx.send(action);
    }

    pub fn dispatch_after(&self, delay: Duration, action: SessionAction) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(action);
        });
    }
}

pub fn apply_actions(
    session: &mut SessionController,
    actions: impl IntoIterator<Item = SessionAction>,
) -> Vec<SessionCommand> {
    let mut commands = Vec::new();
    for action in actions {
        if let Some(cmd) = apply_action(session, action) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(session: &mut SessionController, action: SessionAction) -> Option<SessionCommand> {
    match action {
        SessionAction::Submit { text } => match session.submit(&text) {
            SubmitOutcome::Dispatched(command) => Some(command),
            SubmitOutcome::CredentialRequired(_) => None,
            SubmitOutcome::Ignored(reason) => {
                debug!(?reason, "Submit ignored");
                None
            }
        },
        SessionAction::SelectProvider { provider } => {
            if !session.select_provider(provider) {
                debug!(provider = %provider, "Provider change ignored while a send is in flight");
            }
            None
        }
        SessionAction::OpenCredentialPrompt { provider } => {
            let provider = provider.unwrap_or(session.active_provider());
            session.request_credential(provider);
            None
        }
        SessionAction::RetargetPrompt { provider } => {
            session.retarget_prompt(provider);
            None
        }
        SessionAction::SaveCredential { provider, secret } => {
            match session.save_credential(provider, &secret) {
                Ok(command) => command,
                Err(err) => {
                    debug!(error = %err, "Credential not saved");
                    None
                }
            }
        }
        SessionAction::CancelCredentialPrompt => {
            session.cancel_credential_prompt();
            None
        }
        SessionAction::ForgetCredential { provider } => {
            let provider = provider.unwrap_or(session.active_provider());
            if let Err(err) = session.forget_credential(provider) {
                warn!(provider = %provider, error = %err, "Failed to remove credential");
            }
            None
        }
        SessionAction::PromptDue { provider } => {
            session.prompt_due(provider);
            None
        }
        SessionAction::Stream { message, stream_id } => {
            session.handle_stream_message(message, stream_id)
        }
    }
}
