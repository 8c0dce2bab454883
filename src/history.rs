//! Append-only conversation history
//!
//! The history is the unit of exchange with the model service: every
//! request carries a snapshot of the whole log.

use crate::llm::ToolInvocation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A single conversation turn entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    /// Assistant message that requested one or more tool calls
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolInvocation>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::assistant(content)
        }
    }

    /// Result of executing `invocation`
    pub fn tool_result(invocation: &ToolInvocation, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_name: Some(invocation.name.clone()),
            tool_call_id: Some(invocation.id.clone()),
            tool_calls: Vec::new(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Whether this message requested the call that `tool` answers
    fn answers(&self, tool: &Message) -> bool {
        if self.role != Role::Assistant {
            return false;
        }
        self.tool_calls.iter().any(|call| match &tool.tool_call_id {
            Some(id) => &call.id == id,
            None => Some(&call.name) == tool.tool_name.as_ref(),
        })
    }
}

/// Reasons a message is refused by the history
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("{0} message has empty content")]
    EmptyContent(&'static str),
    #[error("tool message is missing a tool name")]
    MissingToolName,
    #[error("tool message for '{0}' does not answer any earlier tool call")]
    UnmatchedToolResult(String),
}

/// Ordered, append-only log of messages.
///
/// Insertion order is temporal order. Messages are never reordered,
/// altered or removed.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the log.
    ///
    /// A refused message leaves the history untouched.
    pub fn append(&mut self, message: Message) -> Result<(), HistoryError> {
        self.validate(&message)?;
        self.messages.push(message);
        Ok(())
    }

    fn validate(&self, message: &Message) -> Result<(), HistoryError> {
        match message.role {
            Role::User if message.content.is_empty() => Err(HistoryError::EmptyContent("user")),
            Role::Assistant if message.content.is_empty() && !message.has_tool_calls() => {
                Err(HistoryError::EmptyContent("assistant"))
            }
            Role::Tool => {
                let Some(name) = &message.tool_name else {
                    return Err(HistoryError::MissingToolName);
                };
                if message.content.is_empty() {
                    return Err(HistoryError::EmptyContent("tool"));
                }
                if !self.messages.iter().any(|m| m.answers(message)) {
                    return Err(HistoryError::UnmatchedToolResult(name.clone()));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Owned copy of every message appended so far
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    #[allow(dead_code)] // Used in tests
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[allow(dead_code)] // Used in tests
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)] // API completeness
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
