//! Conversation turn controller
//!
//! One turn: append the user message, ask the model with tools offered,
//! and either record its answer directly or dispatch its tool calls and ask
//! again with tools withheld.

pub mod state;

pub use state::{transition, TransitionError, TurnEvent, TurnState};

use crate::history::{ConversationHistory, HistoryError, Message};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::retrieval::{DocumentSearch, RetrievalError};
use crate::tools::{DispatchError, ToolDispatcher, ToolManifest};
use std::sync::Arc;
use thiserror::Error;

/// Errors that abort a turn. History appended before the failure is kept.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("model request failed: {0}")]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error("history rejected message: {0}")]
    History(#[from] HistoryError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<DispatchError> for TurnError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Retrieval(e) => Self::Retrieval(e),
            DispatchError::History(e) => Self::History(e),
        }
    }
}

/// Result of a completed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Final answer text, verbatim from the model
    pub answer: String,
    /// Number of messages this turn added to history
    pub appended: usize,
    /// Number of document searches performed
    pub retrievals: usize,
}

/// Drives single turns against a model service and a document store
pub struct TurnController {
    llm: Arc<dyn LlmService>,
    dispatcher: ToolDispatcher,
    manifest: ToolManifest,
}

impl TurnController {
    pub fn new(llm: Arc<dyn LlmService>, search: Arc<dyn DocumentSearch>) -> Self {
        Self {
            llm,
            dispatcher: ToolDispatcher::new(search),
            manifest: ToolManifest::standard(),
        }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Run one user turn to completion.
    pub async fn run_turn(
        &self,
        history: &mut ConversationHistory,
        user_text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let start_len = history.len();
        history.append(Message::user(user_text))?;
        let mut state = TurnState::AwaitingModel;

        let request = LlmRequest::new(history.snapshot())
            .with_tools(self.manifest.definitions().to_vec());
        let response = self.llm.complete(&request).await?;
        state = advance(
            state,
            TurnEvent::ModelResponded {
                tool_calls: response.tool_calls.len(),
            },
        )?;

        let mut retrievals = 0;
        let answer = if state == TurnState::DirectAnswer {
            let answer = response.content;
            history.append(Message::assistant(answer.clone()))?;
            state = advance(state, TurnEvent::AnswerRecorded)?;
            answer
        } else {
            let LlmResponse {
                content,
                tool_calls,
                ..
            } = response;
            state = advance(state, TurnEvent::DispatchStarted)?;
            let summary = self
                .dispatcher
                .dispatch(Message::assistant_tool_calls(content, tool_calls), history)
                .await?;
            retrievals = summary.retrieved;
            tracing::debug!(
                retrieved = summary.retrieved,
                continued = summary.continued,
                ignored = summary.ignored,
                "Tool calls dispatched"
            );
            state = advance(state, TurnEvent::DispatchFinished)?;

            // Always ask again, even if every call was the no-op tool
            let final_response = self
                .llm
                .complete(&LlmRequest::new(history.snapshot()))
                .await?;
            if final_response.has_tool_calls() {
                tracing::warn!(
                    count = final_response.tool_calls.len(),
                    "Ignoring tool calls in final response"
                );
            }
            state = advance(
                state,
                TurnEvent::ModelResponded {
                    tool_calls: final_response.tool_calls.len(),
                },
            )?;
            history.append(Message::assistant(final_response.content.clone()))?;
            final_response.content
        };

        debug_assert!(state.is_terminal());
        Ok(TurnOutcome {
            answer,
            appended: history.len() - start_len,
            retrievals,
        })
    }
}

fn advance(state: TurnState, event: TurnEvent) -> Result<TurnState, TransitionError> {
    let next = transition(state, event)?;
    tracing::debug!(from = %state, to = %next, "Turn state changed");
    Ok(next)
}
