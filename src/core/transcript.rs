//! Append-only conversation log.
//!
//! A [`Transcript`] is an immutable value. Every change produces a new value,
//! so snapshots handed to the renderer never alias the controller's copy.
//! Messages are shared between snapshots; a transition only allocates the
//! message it adds or replaces.

use std::sync::Arc;

use crate::core::message::{Message, Role};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Arc<[Arc<Message>]>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl ExactSizeIterator<Item = &Message> + '_ {
        self.messages.iter().map(|message| message.as_ref())
    }

    /// Shared handles to each message, for cheap identity checks.
    pub fn entries(&self) -> &[Arc<Message>] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last().map(|message| message.as_ref())
    }

    /// Returns a transcript with `message` appended.
    pub fn appended(&self, message: Message) -> Transcript {
        self.messages
            .iter()
            .cloned()
            .chain(std::iter::once(Arc::new(message)))
            .collect()
    }

    /// Returns a transcript whose last message carries `content`.
    ///
    /// Yields `None` when the transcript is empty.
    pub fn with_last_content(&self, content: String) -> Option<Transcript> {
        let (last, earlier) = self.messages.split_last()?;
        let replaced = Arc::new(Message {
            role: last.role,
            content,
        });
        Some(
            earlier
                .iter()
                .cloned()
                .chain(std::iter::once(replaced))
                .collect(),
        )
    }

    /// Messages to replay to the provider, excluding a trailing placeholder.
    pub fn context(&self) -> Vec<Message> {
        let end = match self.messages.last() {
            Some(last) if last.is_placeholder() => self.messages.len() - 1,
            _ => self.messages.len(),
        };
        self.messages[..end]
            .iter()
            .map(|message| message.as_ref().clone())
            .collect()
    }

    /// Content of the trailing assistant turn, if the transcript ends with one.
    pub fn trailing_assistant(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|message| message.role == Role::Assistant)
            .map(|message| message.content.as_str())
    }
}

impl FromIterator<Arc<Message>> for Transcript {
    fn from_iter<I: IntoIterator<Item = Arc<Message>>>(iter: I) -> Self {
        Transcript {
            messages: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<Message> for Transcript {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        iter.into_iter().map(Arc::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_leaves_the_original_untouched() {
        let first = Transcript::new().appended(Message::user("hello"));
        let second = first.appended(Message::placeholder());

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(second.messages().next(), Some(&Message::user("hello")));
    }

    #[test]
    fn with_last_content_only_touches_the_tail() {
        let transcript: Transcript = [
            Message::user("a"),
            Message::assistant("b"),
            Message::user("c"),
            Message::placeholder(),
        ]
        .into_iter()
        .collect();

        let updated = transcript.with_last_content("done".into()).unwrap();
        for (before, after) in transcript.entries()[..3].iter().zip(&updated.entries()[..3]) {
            assert!(Arc::ptr_eq(before, after));
        }
        assert_eq!(updated.last(), Some(&Message::assistant("done")));
        assert!(transcript.last().unwrap().is_placeholder());
    }

    #[test]
    fn with_last_content_on_empty_transcript_is_none() {
        assert!(Transcript::new().with_last_content("x".into()).is_none());
    }

    #[test]
    fn context_drops_only_a_trailing_placeholder() {
        let transcript = Transcript::new()
            .appended(Message::user("q"))
            .appended(Message::placeholder());
        assert_eq!(transcript.context(), vec![Message::user("q")]);

        let settled = transcript.with_last_content("a".into()).unwrap();
        assert_eq!(settled.context().len(), 2);
    }

    #[test]
    fn trailing_assistant_ignores_user_tail() {
        let transcript = Transcript::new().appended(Message::user("q"));
        assert_eq!(transcript.trailing_assistant(), None);
        let transcript = transcript.appended(Message::assistant("partial"));
        assert_eq!(transcript.trailing_assistant(), Some("partial"));
    }
}
