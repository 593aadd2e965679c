//! Line-oriented rendering of session events.
//!
//! Each transcript event supersedes the previous one. The renderer keeps what
//! it has already written so that a growing reply prints only its new suffix,
//! and a replaced reply (a failed send) is printed again on its own line.

use std::io::{self, Write};
use std::sync::Arc;

use crate::core::credentials::CredentialStore;
use crate::core::events::SessionEvent;
use crate::core::message::{Message, Role};
use crate::core::providers::{ProviderId, ProviderRegistry};
use crate::core::transcript::Transcript;

const ASSISTANT_PREFIX: &str = "assistant> ";

pub struct Renderer<W: Write> {
    out: W,
    /// Message written so far, per transcript index.
    written: Vec<Arc<Message>>,
    /// A reply line is open and still needs its newline.
    line_open: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: Vec::new(),
            line_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, event: &SessionEvent) -> io::Result<()> {
        match event {
            SessionEvent::Transcript(transcript) => self.render_transcript(transcript)?,
            SessionEvent::Pending(true) => {}
            SessionEvent::Pending(false) => self.close_line()?,
            SessionEvent::CredentialRequired(provider) => self.notice(&format!(
                "Enter an API key for {provider} (empty line or /cancel to dismiss):"
            ))?,
            SessionEvent::PromptRetargeted(provider) => {
                self.notice(&format!("The key will be saved for {provider}."))?
            }
            SessionEvent::CredentialSaved(provider) => {
                self.notice(&format!("Saved API key for {provider}."))?
            }
            SessionEvent::CredentialRejected { provider, reason } => {
                self.notice(&format!("API key for {provider} was not saved: {reason}"))?
            }
            SessionEvent::CredentialCleared(provider) => {
                self.notice(&format!("Removed API key for {provider}."))?
            }
            SessionEvent::PromptClosed => {}
            SessionEvent::ProviderSelected(provider) => {
                self.notice(&format!("Now chatting with {provider}."))?
            }
        }
        self.out.flush()
    }

    fn render_transcript(&mut self, transcript: &Transcript) -> io::Result<()> {
        for (index, message) in transcript.entries().iter().enumerate() {
            match self.written.get(index) {
                Some(previous) if Arc::ptr_eq(previous, message) => {}
                Some(previous) => {
                    if let Some(suffix) = message.content.strip_prefix(previous.content.as_str()) {
                        write!(self.out, "{suffix}")?;
                    } else {
                        self.close_line()?;
                        write!(self.out, "{ASSISTANT_PREFIX}{}", message.content)?;
                        self.line_open = true;
                    }
                    self.written[index] = Arc::clone(message);
                }
                None => {
                    self.start_message(message)?;
                    self.written.push(Arc::clone(message));
                }
            }
        }
        Ok(())
    }

    fn start_message(&mut self, message: &Message) -> io::Result<()> {
        self.close_line()?;
        match message.role {
            // The user already sees what they typed.
            Role::User => {}
            Role::Assistant => {
                write!(self.out, "{ASSISTANT_PREFIX}{}", message.content)?;
                self.line_open = true;
            }
        }
        Ok(())
    }

    fn close_line(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        Ok(())
    }

    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        self.close_line()?;
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    pub fn providers(
        &mut self,
        registry: &ProviderRegistry,
        credentials: &CredentialStore,
        active: ProviderId,
    ) -> io::Result<()> {
        self.close_line()?;
        for entry in registry.entries() {
            let marker = if entry.id == active { "*" } else { " " };
            let key = if credentials.has(entry.id) {
                "key stored"
            } else {
                "no key"
            };
            writeln!(
                self.out,
                "{marker} {:<8} {:<16} {:<24} {key}",
                entry.id.as_str(),
                entry.display_name,
                entry.model
            )?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::STREAM_FAILURE_MESSAGE;

    fn output(renderer: Renderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn transcript(messages: &[Message]) -> SessionEvent {
        SessionEvent::Transcript(messages.iter().cloned().collect())
    }

    #[test]
    fn streamed_reply_prints_only_new_suffixes() {
        let mut renderer = Renderer::new(Vec::new());
        let user = Message::user("count");
        for event in [
            transcript(&[user.clone(), Message::placeholder()]),
            SessionEvent::Pending(true),
            transcript(&[user.clone(), Message::assistant("1, ")]),
            transcript(&[user.clone(), Message::assistant("1, 2")]),
            SessionEvent::Pending(false),
        ] {
            renderer.render(&event).unwrap();
        }
        assert_eq!(output(renderer), "assistant> 1, 2\n");
    }

    #[test]
    fn replaced_reply_is_reprinted_on_a_new_line() {
        let mut renderer = Renderer::new(Vec::new());
        let user = Message::user("hi");
        for event in [
            transcript(&[user.clone(), Message::placeholder()]),
            transcript(&[user.clone(), Message::assistant("Hel")]),
            transcript(&[user.clone(), Message::assistant(STREAM_FAILURE_MESSAGE)]),
            SessionEvent::Pending(false),
        ] {
            renderer.render(&event).unwrap();
        }
        assert_eq!(
            output(renderer),
            format!("assistant> Hel\nassistant> {STREAM_FAILURE_MESSAGE}\n")
        );
    }

    #[test]
    fn credential_events_print_notices() {
        let mut renderer = Renderer::new(Vec::new());
        renderer
            .render(&SessionEvent::CredentialRequired(ProviderId::Gemini))
            .unwrap();
        renderer.render(&SessionEvent::PromptClosed).unwrap();
        renderer
            .render(&SessionEvent::CredentialSaved(ProviderId::Gemini))
            .unwrap();
        let text = output(renderer);
        assert!(text.starts_with("Enter an API key for gemini"));
        assert!(text.ends_with("Saved API key for gemini.\n"));
    }

    #[test]
    fn provider_listing_marks_active_and_stored_keys() {
        let mut credentials = CredentialStore::in_memory();
        credentials.set(ProviderId::Grok, "xai").unwrap();
        let mut renderer = Renderer::new(Vec::new());
        renderer
            .providers(&ProviderRegistry::builtin(), &credentials, ProviderId::OpenAi)
            .unwrap();

        let text = output(renderer);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let openai = lines.iter().find(|line| line.contains("openai")).unwrap();
        assert!(openai.starts_with('*'));
        assert!(openai.ends_with("no key"));
        let grok = lines.iter().find(|line| line.contains("grok")).unwrap();
        assert!(grok.ends_with("key stored"));
    }
}
