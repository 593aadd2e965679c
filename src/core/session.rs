//! Streaming session controller.
//!
//! Turns a submitted message into one provider stream and folds the stream's
//! messages back into the transcript:
//!
//! ```text
//! Idle --submit--> Dispatching --Opened--> Streaming --End--> Idle
//!                       |                      |
//!                       +------ failure -------+--> Idle (+ re-prompt)
//! ```
//!
//! The controller never performs I/O itself. It returns [`SessionCommand`]s
//! for the event loop to execute and publishes [`SessionEvent`]s for the
//! renderer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::config::Config;
use crate::core::credentials::CredentialStore;
use crate::core::events::{EventPublisher, SessionEvent};
use crate::core::message::Message;
use crate::core::prompt::{CredentialPrompt, PromptError};
use crate::core::providers::{ProviderId, ProviderRegistry};
use crate::core::transcript::Transcript;

/// Shown in place of the assistant reply whenever a send fails.
pub const STREAM_FAILURE_MESSAGE: &str =
    "Something went wrong while talking to the provider. Please check your API key and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dispatching,
    Streaming,
}

#[derive(Debug)]
pub enum SessionCommand {
    SpawnStream(StreamParams),
    /// Ask for a new credential for `provider` once `delay` has elapsed.
    SchedulePrompt {
        provider: ProviderId,
        delay: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyInput,
    NotIdle,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    /// No credential for the provider; the prompt is now open.
    CredentialRequired(ProviderId),
    Dispatched(SessionCommand),
}

impl SubmitOutcome {
    pub fn into_command(self) -> Option<SessionCommand> {
        match self {
            SubmitOutcome::Dispatched(command) => Some(command),
            SubmitOutcome::Ignored(_) | SubmitOutcome::CredentialRequired(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Resend the message that led to a credential prompt after a save.
    pub resume_after_save: bool,
    pub reprompt_delay: Duration,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            resume_after_save: config.resume_after_save(),
            reprompt_delay: config.reprompt_delay(),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The in-flight send.
#[derive(Debug)]
struct ActiveStream {
    provider: ProviderId,
    text: String,
    cancel_token: CancellationToken,
}

#[derive(Debug)]
pub struct SessionController {
    transcript: Transcript,
    active_provider: ProviderId,
    phase: Phase,
    credentials: CredentialStore,
    registry: ProviderRegistry,
    prompt: CredentialPrompt,
    events: EventPublisher,
    options: SessionOptions,
    current_stream_id: u64,
    active_stream: Option<ActiveStream>,
    /// Message to resend after the scheduled re-prompt for a failed send.
    failed_send: Option<(ProviderId, String)>,
}

impl SessionController {
    pub fn new(
        credentials: CredentialStore,
        registry: ProviderRegistry,
        active_provider: ProviderId,
        options: SessionOptions,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = EventPublisher::channel();
        let controller = Self {
            transcript: Transcript::new(),
            active_provider,
            phase: Phase::Idle,
            credentials,
            registry,
            prompt: CredentialPrompt::new(),
            events,
            options,
            current_stream_id: 0,
            active_stream: None,
            failed_send: None,
        };
        (controller, rx)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn active_provider(&self) -> ProviderId {
        self.active_provider
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn prompt(&self) -> &CredentialPrompt {
        &self.prompt
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.active_stream.is_some() && stream_id == self.current_stream_id
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored(IgnoreReason::EmptyInput);
        }
        if self.is_pending() {
            debug!(phase = ?self.phase, "Submit ignored while a send is in flight");
            return SubmitOutcome::Ignored(IgnoreReason::NotIdle);
        }

        let provider = self.active_provider;
        let Some(secret) = self.credentials.get(provider).map(str::to_owned) else {
            debug!(provider = %provider, "No credential; opening prompt");
            self.open_prompt(provider, Some(text.to_string()));
            return SubmitOutcome::CredentialRequired(provider);
        };

        let transcript = self
            .transcript
            .appended(Message::user(text))
            .appended(Message::placeholder());
        self.set_transcript(transcript);
        self.set_phase(Phase::Dispatching);

        self.current_stream_id += 1;
        let cancel_token = CancellationToken::new();
        self.active_stream = Some(ActiveStream {
            provider,
            text: text.to_string(),
            cancel_token: cancel_token.clone(),
        });

        let handle = match self.registry.resolve(provider, &secret) {
            Ok(handle) => handle,
            Err(err) => {
                return match self.fail(&err.to_string()) {
                    Some(command) => SubmitOutcome::Dispatched(command),
                    None => SubmitOutcome::Ignored(IgnoreReason::NotIdle),
                };
            }
        };

        debug!(
            provider = %provider,
            model = %handle.model,
            stream_id = self.current_stream_id,
            "Dispatching message"
        );
        SubmitOutcome::Dispatched(SessionCommand::SpawnStream(StreamParams {
            handle,
            messages: self.transcript.context(),
            cancel_token,
            stream_id: self.current_stream_id,
        }))
    }

    /// Switch providers. Ignored while a send is in flight.
    pub fn select_provider(&mut self, provider: ProviderId) -> bool {
        if self.is_pending() {
            return false;
        }
        self.active_provider = provider;
        self.events.publish(SessionEvent::ProviderSelected(provider));
        true
    }

    pub fn handle_stream_message(
        &mut self,
        message: StreamMessage,
        stream_id: u64,
    ) -> Option<SessionCommand> {
        if !self.is_current_stream(stream_id) {
            debug!(stream_id, current = self.current_stream_id, "Dropping stale stream message");
            return None;
        }
        match message {
            StreamMessage::Opened => {
                if self.phase == Phase::Dispatching {
                    self.set_phase(Phase::Streaming);
                }
                None
            }
            StreamMessage::Chunk(chunk) => {
                self.append_chunk(&chunk);
                None
            }
            StreamMessage::Error(detail) => self.fail(&detail),
            StreamMessage::End => {
                self.settle();
                None
            }
        }
    }

    fn append_chunk(&mut self, chunk: &str) {
        if self.phase == Phase::Dispatching {
            self.set_phase(Phase::Streaming);
        }
        let Some(current) = self.transcript.trailing_assistant() else {
            return;
        };
        let mut content = String::with_capacity(current.len() + chunk.len());
        content.push_str(current);
        content.push_str(chunk);
        if let Some(transcript) = self.transcript.with_last_content(content) {
            self.set_transcript(transcript);
        }
    }

    fn settle(&mut self) {
        if !self.is_pending() {
            return;
        }
        self.active_stream = None;
        debug!(stream_id = self.current_stream_id, "Stream settled");
        self.set_phase(Phase::Idle);
    }

    /// Replace the reply with the failure message, drop the credential that
    /// was used, and schedule a re-prompt.
    fn fail(&mut self, detail: &str) -> Option<SessionCommand> {
        if !self.is_pending() {
            return None;
        }
        let active = self.active_stream.take()?;
        active.cancel_token.cancel();
        warn!(
            provider = %active.provider,
            stream_id = self.current_stream_id,
            error = %detail,
            "Send failed"
        );

        if let Some(transcript) = self
            .transcript
            .with_last_content(STREAM_FAILURE_MESSAGE.to_string())
        {
            self.set_transcript(transcript);
        }

        match self.credentials.clear(active.provider) {
            Ok(()) => self
                .events
                .publish(SessionEvent::CredentialCleared(active.provider)),
            Err(err) => warn!(provider = %active.provider, error = %err, "Failed to clear credential"),
        }

        self.failed_send = Some((active.provider, active.text));
        self.set_phase(Phase::Idle);

        Some(SessionCommand::SchedulePrompt {
            provider: active.provider,
            delay: self.options.reprompt_delay,
        })
    }

    /// The re-prompt delay after a failure has elapsed.
    ///
    /// Anything the user did during the delay wins: a new send in flight, a
    /// credential entered again, or a prompt they already have open.
    pub fn prompt_due(&mut self, provider: ProviderId) {
        let resume = self
            .failed_send
            .take_if(|(failed_provider, _)| *failed_provider == provider)
            .map(|(_, text)| text);

        if self.is_pending() || self.credentials.has(provider) {
            debug!(provider = %provider, "Re-prompt superseded");
            return;
        }
        if self.prompt.is_open() {
            debug!(provider = %provider, "Re-prompt skipped; prompt already open");
            return;
        }
        self.open_prompt(provider, resume);
    }

    /// Open the prompt on request, without a message to resume.
    pub fn request_credential(&mut self, provider: ProviderId) {
        self.open_prompt(provider, None);
    }

    fn open_prompt(&mut self, provider: ProviderId, resume: Option<String>) {
        self.prompt.open(provider, resume);
        self.events
            .publish(SessionEvent::CredentialRequired(provider));
    }

    pub fn retarget_prompt(&mut self, provider: ProviderId) -> bool {
        let changed = self.prompt.retarget(provider);
        if changed {
            self.events.publish(SessionEvent::PromptRetargeted(provider));
        }
        changed
    }

    /// Save a credential through the open prompt.
    ///
    /// With the resume policy on, the message that triggered the prompt is
    /// resent when the saved provider is still the active one.
    pub fn save_credential(
        &mut self,
        provider: Option<ProviderId>,
        secret: &str,
    ) -> Result<Option<SessionCommand>, PromptError> {
        if let Some(provider) = provider {
            if !self.prompt.retarget(provider) {
                return Err(PromptError::NotOpen);
            }
        }
        let target = self.prompt.target();
        let saved = match self.prompt.save(&mut self.credentials, secret) {
            Ok(saved) => saved,
            Err(err) => {
                if let (PromptError::Credential(reason), Some(provider)) = (&err, target) {
                    self.events.publish(SessionEvent::CredentialRejected {
                        provider,
                        reason: reason.to_string(),
                    });
                }
                return Err(err);
            }
        };
        self.events
            .publish(SessionEvent::CredentialSaved(saved.provider));
        self.events.publish(SessionEvent::PromptClosed);

        let resume = saved
            .resume
            .filter(|_| self.options.resume_after_save && saved.provider == self.active_provider);
        let Some(text) = resume else {
            return Ok(None);
        };
        debug!(provider = %saved.provider, "Resuming send after credential save");
        Ok(self.submit(&text).into_command())
    }

    pub fn cancel_credential_prompt(&mut self) -> bool {
        let was_open = self.prompt.cancel();
        if was_open {
            self.events.publish(SessionEvent::PromptClosed);
        }
        was_open
    }

    /// Remove a stored credential on explicit user request.
    pub fn forget_credential(
        &mut self,
        provider: ProviderId,
    ) -> Result<(), crate::core::credentials::CredentialError> {
        self.credentials.clear(provider)?;
        self.events.publish(SessionEvent::CredentialCleared(provider));
        Ok(())
    }

    /// Abandon the in-flight stream, if any. Used when the session ends.
    pub fn shutdown(&mut self) {
        if let Some(active) = self.active_stream.take() {
            active.cancel_token.cancel();
        }
    }

    fn set_transcript(&mut self, transcript: Transcript) {
        self.transcript = transcript;
        self.events
            .publish(SessionEvent::Transcript(self.transcript.clone()));
    }

    fn set_phase(&mut self, phase: Phase) {
        let was_pending = self.is_pending();
        self.phase = phase;
        if was_pending != self.is_pending() {
            self.events.publish(SessionEvent::Pending(self.is_pending()));
        }
    }
}
