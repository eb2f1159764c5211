//! Routing requests: what a caller wants relayed to a node.

use serde::{Deserialize, Serialize};

/// A single chat message in the upstream wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

/// The generation payload: chat turns or a bare completion prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingPayload {
    Chat(Vec<ChatMessage>),
    Generate(String),
}

impl RoutingPayload {
    /// Upstream path this payload is posted to.
    #[must_use]
    pub const fn upstream_path(&self) -> &'static str {
        match self {
            Self::Chat(_) => "/api/chat",
            Self::Generate(_) => "/api/generate",
        }
    }
}

/// One inbound generation request, built per call and never persisted.
///
/// `options` is an open-ended bag (temperature, num_predict, ...) passed
/// through to the node untouched.
#[derive(Debug, Clone)]
pub struct RoutingRequest {
    pub model: String,
    pub payload: RoutingPayload,
    pub stream: bool,
    pub options: serde_json::Value,
    /// Explicit node endpoint; `None` means "first online node".
    pub endpoint_hint: Option<String>,
}

impl RoutingRequest {
    /// Build the JSON body the selected node expects.
    #[must_use]
    pub fn upstream_body(&self) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert("model".to_string(), self.model.clone().into());
        match &self.payload {
            RoutingPayload::Chat(messages) => {
                body.insert(
                    "messages".to_string(),
                    serde_json::to_value(messages).unwrap_or_default(),
                );
            }
            RoutingPayload::Generate(prompt) => {
                body.insert("prompt".to_string(), prompt.clone().into());
            }
        }
        body.insert("stream".to_string(), self.stream.into());
        body.insert("options".to_string(), self.options.clone());
        serde_json::Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_body_carries_messages_and_options() {
        let request = RoutingRequest {
            model: "qwen3:8b".to_string(),
            payload: RoutingPayload::Chat(vec![ChatMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }]),
            stream: true,
            options: json!({ "temperature": 0.7 }),
            endpoint_hint: None,
        };

        let body = request.upstream_body();
        assert_eq!(body["model"], "qwen3:8b");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["stream"], true);
        assert_eq!(body["options"]["temperature"], 0.7);
        assert!(body.get("prompt").is_none());
    }

    #[test]
    fn generate_body_carries_prompt() {
        let request = RoutingRequest {
            model: "phi-3".to_string(),
            payload: RoutingPayload::Generate("once upon".to_string()),
            stream: false,
            options: json!({}),
            endpoint_hint: None,
        };

        let body = request.upstream_body();
        assert_eq!(body["prompt"], "once upon");
        assert_eq!(body["stream"], false);
        assert!(body.get("messages").is_none());
        assert_eq!(request.payload.upstream_path(), "/api/generate");
    }
}
