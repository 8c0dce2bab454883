//! Interactive session loop
//!
//! Reads one user message per line and prints each turn's answer followed
//! by a blank line. A failed turn is reported for that line only and the
//! session carries on.

use crate::history::ConversationHistory;
use crate::turn::TurnController;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const PROMPT: &str = "> ";

/// Counters reported when the input ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub turns: usize,
    pub failed: usize,
}

/// Owns the conversation history for the lifetime of one session
pub struct Session {
    controller: TurnController,
    history: ConversationHistory,
}

impl Session {
    pub fn new(controller: TurnController) -> Self {
        Self {
            controller,
            history: ConversationHistory::new(),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Run until `input` is exhausted
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> std::io::Result<SessionStats>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(model = %self.controller.model_id(), "Session started");
        let mut lines = input.lines();
        let mut stats = SessionStats::default();

        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }

            stats.turns += 1;
            match self.controller.run_turn(&mut self.history, question).await {
                Ok(outcome) => {
                    tracing::debug!(
                        appended = outcome.appended,
                        retrievals = outcome.retrievals,
                        history_len = self.history.len(),
                        "Turn completed"
                    );
                    output.write_all(outcome.answer.as_bytes()).await?;
                    output.write_all(b"\n\n").await?;
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(error = %e, history_len = self.history.len(), "Turn failed");
                    output.write_all(format!("error: {e}\n\n").as_bytes()).await?;
                }
            }
        }

        output.write_all(b"\n").await?;
        output.flush().await?;
        tracing::info!(turns = stats.turns, failed = stats.failed, "Session ended");
        Ok(stats)
    }
}
