//! Wire payloads for the provider endpoint families.

use serde::{Deserialize, Serialize};

use crate::core::message::Message;

pub mod gemini;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn streaming(model: &str, messages: &[Message]) -> Self {
        Self {
            model: model.to_string(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: true,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseDelta {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseChoice {
    pub delta: ChatResponseDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    pub choices: Vec<ChatResponseChoice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_request_replays_roles_and_content_in_order() {
        let messages = [
            Message::user("2+2?"),
            Message::assistant("4"),
            Message::user("and 3+3?"),
        ];
        let request = ChatRequest::streaming("gpt-4o-mini", &messages);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][1]["role"], "assistant");
        assert_eq!(value["messages"][1]["content"], "4");
        assert_eq!(value["messages"][2]["content"], "and 3+3?");
    }

    #[test]
    fn delta_without_content_parses() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#).unwrap();
        assert!(response.choices[0].delta.content.is_none());
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
    }
}
