//! Retrieval tool: searches the bird-species corpus

use crate::llm::ToolDefinition;
use crate::retrieval::{coerce_limit, RetrievalError};
use serde_json::{json, Value};

pub const NAME: &str = "query_vector_db";

/// Result count used when the model leaves `n_results` out
const DEFAULT_RESULTS: usize = 1;

const NO_MATCHES: &str = "No matching documents were found in the database.";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: "Queries a vector database of bird species Wiki documents and returns the \
                      closest matching one(s). This function should be called very conservatively."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Bird species search query"
                },
                "n_results": {
                    "type": "integer",
                    "description":
                        "Number of closest matching documents to retrieve from the database"
                }
            }
        }),
    }
}

/// Validated retrieval arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryArgs {
    pub query: String,
    pub n_results: usize,
}

impl QueryArgs {
    /// Coerce raw model-supplied arguments
    pub fn from_value(arguments: &Value) -> Result<Self, RetrievalError> {
        if !arguments.is_object() {
            return Err(RetrievalError::argument(
                "arguments",
                format!("expected a JSON object, got {arguments}"),
            ));
        }

        let query = match arguments.get("query") {
            Some(Value::String(q)) if !q.trim().is_empty() => q.trim().to_string(),
            Some(Value::String(_)) => {
                return Err(RetrievalError::argument("query", "must not be empty"))
            }
            Some(other) => {
                return Err(RetrievalError::argument(
                    "query",
                    format!("expected text, got {other}"),
                ))
            }
            None => return Err(RetrievalError::argument("query", "missing")),
        };

        let n_results = match arguments.get("n_results") {
            None | Some(Value::Null) => DEFAULT_RESULTS,
            Some(raw) => coerce_limit(raw)?,
        };

        Ok(Self { query, n_results })
    }
}

/// Render passages as the content of a tool-result message
pub fn render_passages(passages: &[String]) -> String {
    if passages.is_empty() {
        return NO_MATCHES.to_string();
    }
    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("[{}] {}", i + 1, passage.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
