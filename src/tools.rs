//! Tool manifest and dispatch
//!
//! The model decides which tools to call, but the set it can actually reach
//! is closed: every invocation resolves to one of a fixed number of
//! variants, and anything unrecognized resolves to `Ignore`.

mod continue_conversation;
mod query_vector_db;

pub use query_vector_db::{render_passages, QueryArgs};

use crate::history::{ConversationHistory, HistoryError, Message};
use crate::llm::{ToolDefinition, ToolInvocation};
use crate::retrieval::{DocumentSearch, RetrievalError};
use std::sync::Arc;
use thiserror::Error;

/// Static set of tool descriptors offered to the model
#[derive(Debug, Clone)]
pub struct ToolManifest {
    definitions: Vec<ToolDefinition>,
}

impl ToolManifest {
    /// The no-op tool followed by the retrieval tool
    pub fn standard() -> Self {
        Self {
            definitions: vec![
                continue_conversation::definition(),
                query_vector_db::definition(),
            ],
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }
}

/// What a single invocation resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCall {
    /// The model chose not to retrieve; nothing to do
    Continue,
    /// Run a document search with coerced arguments
    Retrieve(QueryArgs),
    /// Unrecognized tool name; silently dropped
    Ignore { name: String },
}

impl ResolvedCall {
    /// Pure mapping from an invocation to its handler.
    ///
    /// Argument coercion for recognized tools happens here, so a malformed
    /// retrieval call fails before any search is attempted.
    pub fn resolve(invocation: &ToolInvocation) -> Result<Self, RetrievalError> {
        match invocation.name.as_str() {
            continue_conversation::NAME => Ok(Self::Continue),
            query_vector_db::NAME => {
                QueryArgs::from_value(&invocation.arguments).map(Self::Retrieve)
            }
            other => Ok(Self::Ignore {
                name: other.to_string(),
            }),
        }
    }
}

/// Errors that abort dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Counts of what a dispatch did, by variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub retrieved: usize,
    pub continued: usize,
    pub ignored: usize,
}

/// Executes the tool calls of one assistant turn
pub struct ToolDispatcher {
    search: Arc<dyn DocumentSearch>,
}

impl ToolDispatcher {
    pub fn new(search: Arc<dyn DocumentSearch>) -> Self {
        Self { search }
    }

    /// Append `call_message` and then one tool result per retrieval, in the
    /// order the invocations were delivered.
    ///
    /// On error, whatever was appended before the failing invocation stays.
    pub async fn dispatch(
        &self,
        call_message: Message,
        history: &mut ConversationHistory,
    ) -> Result<DispatchSummary, DispatchError> {
        let invocations = call_message.tool_calls.clone();
        history.append(call_message)?;

        let mut summary = DispatchSummary::default();
        for invocation in &invocations {
            match ResolvedCall::resolve(invocation)? {
                ResolvedCall::Continue => {
                    tracing::debug!(
                        call_id = %invocation.id,
                        "Model chose to continue without retrieval"
                    );
                    summary.continued += 1;
                }
                ResolvedCall::Retrieve(args) => {
                    tracing::info!(
                        call_id = %invocation.id,
                        query = %args.query,
                        n_results = args.n_results,
                        "Querying document store"
                    );
                    let passages = self.search.search(&args.query, args.n_results).await?;
                    history.append(Message::tool_result(invocation, render_passages(&passages)))?;
                    summary.retrieved += 1;
                }
                ResolvedCall::Ignore { name } => {
                    tracing::debug!(
                        call_id = %invocation.id,
                        tool = %name,
                        "Ignoring unknown tool call"
                    );
                    summary.ignored += 1;
                }
            }
        }

        Ok(summary)
    }
}
