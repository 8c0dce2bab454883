//! Ollama provider implementation
//!
//! Talks to the native `/api/chat` endpoint with streaming disabled.

use super::types::{LlmRequest, LlmResponse, ToolInvocation, Usage};
use super::{LlmError, LlmService};
use crate::history::{Message, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const DEFAULT_HOST: &str = "http://127.0.0.1:11434";
const DEFAULT_PORT: u16 = 11434;
const DEFAULT_MODEL: &str = "llama3.1:8b-instruct-q4_K_M";

/// Configuration for the chat model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Base URL of the Ollama server
    pub host: String,
    /// Model tag, e.g. `llama3.1:8b-instruct-q4_K_M`
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("OLLAMA_HOST").map_or(defaults.host, |h| normalize_host(&h)),
            model: std::env::var("BIRD_ID_MODEL").unwrap_or(defaults.model),
        }
    }
}

/// Accept the forms `OLLAMA_HOST` is commonly set to (`0.0.0.0:11434`,
/// `localhost`, a full URL) and produce a base URL without trailing slash.
///
/// Only plain http gets the default Ollama port; https without an explicit
/// port stays on 443.
pub(crate) fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return DEFAULT_HOST.to_string();
    }
    let (scheme, authority) = host.split_once("://").unwrap_or(("http", host));
    if authority.contains(':') || scheme == "https" {
        format!("{scheme}://{authority}")
    } else {
        format!("{scheme}://{authority}:{DEFAULT_PORT}")
    }
}

/// Ollama chat service
pub struct OllamaService {
    client: Client,
    chat_url: String,
    model: String,
}

impl OllamaService {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            chat_url: format!("{}/api/chat", normalize_host(&config.host)),
            model: config.model.clone(),
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> OllamaRequest {
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| OllamaTool {
                        r#type: "function".to_string(),
                        function: OllamaFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.input_schema.clone(),
                        },
                    })
                    .collect(),
            )
        };

        OllamaRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(translate_message).collect(),
            tools,
            stream: false,
        }
    }
}

fn translate_message(msg: &Message) -> OllamaMessage {
    let tool_calls = if msg.tool_calls.is_empty() {
        None
    } else {
        Some(
            msg.tool_calls
                .iter()
                .map(|call| OllamaToolCall {
                    id: Some(call.id.clone()),
                    function: OllamaFunctionCall {
                        name: call.name.clone(),
                        // Ollama only accepts an object here
                        arguments: if call.arguments.is_object() {
                            call.arguments.clone()
                        } else {
                            Value::Object(serde_json::Map::new())
                        },
                    },
                })
                .collect(),
        )
    };

    OllamaMessage {
        role: msg.role.as_str().to_string(),
        content: msg.content.clone(),
        tool_calls,
        tool_name: match msg.role {
            Role::Tool => msg.tool_name.clone(),
            Role::User | Role::Assistant => None,
        },
    }
}

fn normalize_response(resp: OllamaResponse) -> LlmResponse {
    let tool_calls = resp
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter(|tc| !tc.function.name.is_empty())
        .map(|tc| {
            // Some models emit arguments as a JSON-encoded string. One that
            // does not parse is kept as-is so argument coercion can report it.
            let arguments = match tc.function.arguments {
                Value::String(raw) => match serde_json::from_str(&raw) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            arguments = %raw,
                            "Failed to parse tool call arguments"
                        );
                        Value::String(raw)
                    }
                },
                Value::Null => Value::Object(serde_json::Map::new()),
                other => other,
            };
            let id = tc
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
            ToolInvocation {
                id,
                name: tc.function.name,
                arguments,
            }
        })
        .collect();

    LlmResponse {
        content: resp.message.content,
        tool_calls,
        usage: Usage {
            input_tokens: resp.prompt_eval_count.unwrap_or(0),
            output_tokens: resp.eval_count.unwrap_or(0),
        },
    }
}

#[async_trait]
impl LlmService for OllamaService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let ollama_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.chat_url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<OllamaErrorResponse>(&body)
                .map_or(body, |resp| resp.error);
            return Err(match status.as_u16() {
                404 => LlmError::model_not_found(format!("Model not found: {message}")),
                400 => LlmError::invalid_request(format!("Invalid request: {message}")),
                500..=599 => LlmError::server_error(format!("Server error: {message}")),
                _ => LlmError::unknown(format!("HTTP {status}: {message}")),
            });
        }

        let ollama_response: OllamaResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Ok(normalize_response(ollama_response))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    r#type: String,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}
