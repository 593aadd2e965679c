//! Session output stream.
//!
//! The controller publishes every observable change as a [`SessionEvent`] on
//! an unbounded channel with a single consumer, the render layer. Transport
//! timing never reaches the renderer directly.

use tokio::sync::mpsc;

use crate::core::providers::ProviderId;
use crate::core::transcript::Transcript;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new transcript value; the previous one is superseded.
    Transcript(Transcript),
    /// Whether a send is in flight.
    Pending(bool),
    /// A credential is needed for this provider and the prompt is open.
    CredentialRequired(ProviderId),
    /// The prompt target changed before saving.
    PromptRetargeted(ProviderId),
    CredentialSaved(ProviderId),
    CredentialRejected { provider: ProviderId, reason: String },
    CredentialCleared(ProviderId),
    PromptClosed,
    ProviderSelected(ProviderId),
}

#[derive(Clone, Debug)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventPublisher {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Events sent after the subscriber hung up are dropped.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_publish_order() {
        let (publisher, mut rx) = EventPublisher::channel();
        publisher.publish(SessionEvent::Pending(true));
        publisher.publish(SessionEvent::CredentialRequired(ProviderId::Gemini));
        publisher.publish(SessionEvent::Pending(false));

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Pending(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::CredentialRequired(ProviderId::Gemini)
        );
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Pending(false));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscriber_is_harmless() {
        let (publisher, rx) = EventPublisher::channel();
        drop(rx);
        publisher.publish(SessionEvent::PromptClosed);
    }
}
