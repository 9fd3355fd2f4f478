//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM and any endpoint exposing
//! `/chat/completions` with function calling.

use async_trait::async_trait;
use codepilot_core::error::ProviderError;
use codepilot_core::message::{Message, MessageToolCall, Role, ToolCallKind};
use codepilot_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// An OpenAI-compatible chat-completion client.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key, Duration::from_secs(30))
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Result<Self, ProviderError> {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
            Duration::from_secs(120),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| {
                let tool_calls: Vec<serde_json::Value> =
                    m.tool_calls.iter().map(Self::to_api_tool_call).collect();
                // Assistant turns that only call tools carry `content: null`.
                let content = if m.role == Role::Assistant && m.content.is_empty() && !tool_calls.is_empty() {
                    None
                } else {
                    Some(m.content.clone())
                };
                ApiMessage {
                    role: match m.role {
                        Role::User => "user".into(),
                        Role::Assistant => "assistant".into(),
                        Role::System => "system".into(),
                        Role::Tool => "tool".into(),
                    },
                    content,
                    tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
                    tool_call_id: m.tool_call_id.clone(),
                }
            })
            .collect()
    }

    fn to_api_tool_call(tc: &MessageToolCall) -> serde_json::Value {
        match &tc.kind {
            ToolCallKind::Function { name, arguments } => serde_json::json!(ApiToolCall {
                id: tc.id.clone(),
                r#type: "function".into(),
                function: Some(ApiFunction {
                    name: name.clone(),
                    arguments: arguments.clone(),
                }),
                custom: None,
            }),
            ToolCallKind::Custom { name, input } => serde_json::json!(ApiToolCall {
                id: tc.id.clone(),
                r#type: "custom".into(),
                function: None,
                custom: Some(ApiCustom {
                    name: name.clone(),
                    input: input.clone(),
                }),
            }),
            // Replayed verbatim: the tool message answering this id must
            // find its call in the assistant turn.
            ToolCallKind::Unknown { kind, raw } => {
                let mut value = match raw {
                    serde_json::Value::Object(_) => raw.clone(),
                    _ => serde_json::json!({ "type": kind }),
                };
                if value.get("id").is_none() {
                    value["id"] = serde_json::json!(tc.id);
                }
                value
            }
        }
    }

    /// Map a wire tool call onto the closed set of call kinds.
    fn from_api_tool_call(raw: serde_json::Value) -> MessageToolCall {
        let parsed = serde_json::from_value::<ApiToolCall>(raw.clone()).ok();
        let id = match &parsed {
            Some(tc) => tc.id.clone(),
            None => raw.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        };
        let kind = match parsed {
            Some(ApiToolCall { r#type, function: Some(f), .. }) if r#type == "function" || r#type.is_empty() => {
                ToolCallKind::Function {
                    name: f.name,
                    arguments: f.arguments,
                }
            }
            Some(ApiToolCall { r#type, custom: Some(c), .. }) if r#type == "custom" => ToolCallKind::Custom {
                name: c.name,
                input: c.input,
            },
            _ => {
                let kind = match raw.get("type").and_then(|v| v.as_str()) {
                    Some(t) if !t.is_empty() => t.to_string(),
                    _ => "unspecified".to_string(),
                };
                ToolCallKind::Unknown { kind, raw }
            }
        };
        MessageToolCall { id, kind }
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }

    fn parse_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;

        let tool_calls: Vec<MessageToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(Self::from_api_tool_call)
            .collect();

        let message = Message::assistant(choice.message.content.unwrap_or_default())
            .with_tool_calls(tool_calls);

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model,
        })
    }
}

fn network_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl codepilot_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        Self::parse_response(api_response)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(network_error)?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    #[serde(default)]
    id: String,
    #[serde(default)]
    r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function: Option<ApiFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom: Option<ApiCustom>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiCustom {
    name: String,
    #[serde(default)]
    input: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> Result<ProviderResponse, ProviderError> {
        let api: ApiResponse = serde_json::from_value(body).unwrap();
        OpenAiCompatProvider::parse_response(api)
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenAiCompatProvider::new(
            "test",
            "http://localhost:8080/v1/",
            "key",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn plain_text_reply() {
        let resp = parse(json!({
            "model": "gpt-test",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "hi there", "tool_calls": [] },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 }
        }))
        .unwrap();
        assert_eq!(resp.message.content, "hi there");
        assert!(resp.message.tool_calls.is_empty());
        assert_eq!(resp.usage.unwrap().total_tokens, 5);
    }

    #[test]
    fn tool_call_kinds_are_mapped() {
        let resp = parse(json!({
            "model": "gpt-test",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        { "id": "a", "type": "function",
                          "function": { "name": "read_file", "arguments": "{\"path\":\"x.txt\"}" } },
                        { "id": "b", "type": "custom",
                          "custom": { "name": "freeform", "input": "raw text" } },
                        { "id": "c", "type": "computer_use" }
                    ]
                }
            }]
        }))
        .unwrap();

        let calls = &resp.message.tool_calls;
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0].kind,
            ToolCallKind::Function {
                name: "read_file".into(),
                arguments: r#"{"path":"x.txt"}"#.into()
            }
        );
        assert!(matches!(calls[1].kind, ToolCallKind::Custom { ref name, .. } if name == "freeform"));
        assert!(matches!(calls[2].kind, ToolCallKind::Unknown { ref kind, .. } if kind == "computer_use"));
        assert_eq!(resp.message.content, "");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let err = parse(json!({ "model": "gpt-test", "choices": [] })).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn request_body_carries_tools_and_tool_messages() {
        let assistant = Message::assistant("")
            .with_tool_calls(vec![MessageToolCall::function("call_1", "bash", r#"{"command":"ls"}"#)]);
        let request = ProviderRequest {
            model: "gpt-test".into(),
            messages: vec![
                Message::system("be helpful"),
                Message::user("list files"),
                assistant,
                Message::tool_result("call_1", "a.txt"),
            ],
            max_tokens: Some(256),
            tools: vec![ToolDefinition {
                name: "bash".into(),
                description: "Run a command".into(),
                parameters: json!({"type": "object"}),
            }],
        };

        let body = OpenAiCompatProvider::build_body(&request);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "bash");

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[2]["content"].is_null());
        assert_eq!(messages[2]["tool_calls"][0]["function"]["name"], "bash");
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
    }

    #[test]
    fn unknown_calls_are_replayed_next_to_their_tool_message() {
        let resp = parse(json!({
            "model": "gpt-test",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        { "id": "call_u", "type": "computer_use",
                          "computer_use": { "action": "screenshot" } }
                    ]
                }
            }]
        }))
        .unwrap();

        let request = ProviderRequest {
            model: "gpt-test".into(),
            messages: vec![
                Message::user("take a look"),
                resp.message,
                Message::tool_result("call_u", "Error: unsupported tool call type 'computer_use'"),
            ],
            max_tokens: None,
            tools: vec![],
        };

        let body = OpenAiCompatProvider::build_body(&request);
        let messages = body["messages"].as_array().unwrap();
        assert!(messages[1]["content"].is_null());
        let calls = messages[1]["tool_calls"].as_array().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["id"], "call_u");
        assert_eq!(calls[0]["type"], "computer_use");
        assert_eq!(calls[0]["computer_use"]["action"], "screenshot");
        assert_eq!(messages[2]["role"], "tool");
        assert_eq!(messages[2]["tool_call_id"], calls[0]["id"]);
    }

    #[test]
    fn unknown_call_without_wire_payload_still_carries_its_id() {
        let assistant = Message::assistant("").with_tool_calls(vec![MessageToolCall {
            id: "call_x".into(),
            kind: ToolCallKind::Unknown {
                kind: "hologram".into(),
                raw: serde_json::Value::Null,
            },
        }]);
        let api = OpenAiCompatProvider::to_api_messages(&[assistant]);
        let calls = api[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0], json!({ "id": "call_x", "type": "hologram" }));
    }

    #[test]
    fn body_without_tools_omits_the_field() {
        let request = ProviderRequest {
            model: "gpt-test".into(),
            messages: vec![Message::user("hello")],
            max_tokens: None,
            tools: vec![],
        };
        let body = OpenAiCompatProvider::build_body(&request);
        assert!(body.get("tools").is_none());
        assert!(body.get("max_tokens").is_none());
    }
}
