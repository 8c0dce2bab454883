//! No-op tool
//!
//! Small models are eager to call a tool even when none is needed. This
//! one gives them something to call instead of an unnecessary query.

use crate::llm::ToolDefinition;
use serde_json::json;

pub const NAME: &str = "continue_conversation";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: "Continue the conversation without consulting the database.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}
