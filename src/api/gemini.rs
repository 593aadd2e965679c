//! Gemini `streamGenerateContent` payloads.

use serde::{Deserialize, Serialize};

use crate::core::message::{Message, Role};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

impl GeminiRequest {
    /// Gemini calls the assistant role `model` and rejects empty parts.
    pub fn from_messages(messages: &[Message]) -> Self {
        let contents = messages
            .iter()
            .filter(|message| !message.content.is_empty())
            .map(|message| GeminiContent {
                role: Some(
                    match message.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(message.content.clone()),
                }],
            })
            .collect();
        Self { contents }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiStreamResponse {
    #[serde(default)]
    pub candidates: Option<Vec<GeminiCandidate>>,
}

impl GeminiStreamResponse {
    /// Text of the first candidate, with its parts joined in order.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.as_ref()?.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_maps_assistant_to_model_and_skips_empty_turns() {
        let messages = [
            Message::user("hi"),
            Message::assistant(""),
            Message::assistant("hello"),
        ];
        let value = serde_json::to_value(GeminiRequest::from_messages(&messages)).unwrap();
        let contents = value["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "hi");
        assert_eq!(contents[1]["role"], "model");
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let payload = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#;
        let response: GeminiStreamResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello"));
    }

    #[test]
    fn response_without_text_yields_none() {
        let payload = r#"{"candidates":[{"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":3}}"#;
        let response: GeminiStreamResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.text(), None);
        assert_eq!(
            response.candidates.unwrap()[0].finish_reason.as_deref(),
            Some("STOP")
        );
    }
}
