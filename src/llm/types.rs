//! Common types for LLM interactions

use crate::history::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// LLM request
///
/// The full history is sent every time, never a delta. An empty `tools`
/// list means the model must answer directly.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

impl LlmRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Tool definition
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A tool call requested by the model.
///
/// Produced by an external service and not trusted: `arguments` may carry
/// values of the wrong primitive type and must be coerced before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Opaque token linking the call to its result message
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolInvocation {
    #[allow(dead_code)] // Used in tests
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// LLM response
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub content: String,
    pub tool_calls: Vec<ToolInvocation>,
    pub usage: Usage,
}

impl LlmResponse {
    /// Plain text answer with no tool calls
    #[allow(dead_code)] // Used in tests
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Response that requests the given tool calls
    #[allow(dead_code)] // Used in tests
    pub fn tool_calls(calls: Vec<ToolInvocation>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::default()
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
