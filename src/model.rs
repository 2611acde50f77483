use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::config::GenerationParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of a chat completions call. Only one completion is ever requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub n: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub temperature: f32,
    pub top_p: f32,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>, params: &GenerationParams) -> Self {
        Self {
            messages,
            max_tokens: params.max_tokens,
            n: 1,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            temperature: params.temperature,
            top_p: params.top_p,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: Message,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: u32,
}

impl ChatCompletion {
    /// Consumes the completion and returns the first choice's text.
    pub fn into_first_content(self) -> Result<String> {
        let id = self.id;
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("Completion '{}' contained no choices", id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ChatCompletion, ChatRequest, Message, MessageRole};
    use crate::config::GenerationParams;

    fn params() -> GenerationParams {
        GenerationParams {
            max_tokens: 150,
            temperature: 0.7,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.5,
        }
    }

    #[test]
    fn chat_request_serializes_wire_fields() {
        let request = ChatRequest::new(
            vec![Message::system("be brief"), Message::user("hi")],
            &params(),
        );
        let value = serde_json::to_value(&request).expect("request should serialize");

        assert_eq!(value["n"], json!(1));
        assert_eq!(value["max_tokens"], json!(150));
        assert_eq!(value["presence_penalty"], json!(0.5));
        assert_eq!(value["frequency_penalty"], json!(0.0));
        assert!(value["temperature"].is_number());
        assert!(value["top_p"].is_number());
        assert_eq!(
            value["messages"],
            json!([
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"},
            ])
        );
    }

    #[test]
    fn chat_completion_parses_full_response() {
        let body = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-35-turbo",
            "choices": [
                {
                    "message": {"role": "assistant", "content": "Ave."},
                    "finish_reason": "stop",
                    "index": 0
                }
            ]
        });
        let completion: ChatCompletion =
            serde_json::from_value(body).expect("response should parse");

        assert_eq!(completion.model, "gpt-35-turbo");
        assert_eq!(completion.choices[0].message.role, MessageRole::Assistant);
        assert_eq!(completion.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(
            completion.into_first_content().expect("content expected"),
            "Ave."
        );
    }

    #[test]
    fn into_first_content_fails_without_choices() {
        let completion: ChatCompletion =
            serde_json::from_value(json!({"id": "chatcmpl-2", "choices": []}))
                .expect("response should parse");

        let err = completion
            .into_first_content()
            .expect_err("empty choices should fail");
        assert!(
            format!("{err:#}").contains("no choices"),
            "unexpected message: {err:#}"
        );
    }

    #[test]
    fn message_role_rejects_unknown_values() {
        let parsed =
            serde_json::from_value::<Message>(json!({"role": "tool", "content": "x"}));
        assert!(parsed.is_err());
    }
}
