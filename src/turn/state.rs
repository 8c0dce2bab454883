//! Turn state machine
//!
//! Pure transition function: given a state and an event it returns the
//! next state, with no I/O.

use std::fmt;
use thiserror::Error;

/// Where a turn currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// User message appended, first model call in flight
    AwaitingModel,
    /// First response carried no tool calls
    DirectAnswer,
    /// First response carried one or more tool calls
    ToolRequested,
    /// Tool calls being resolved and executed
    Dispatching,
    /// Second model call (no tools offered) in flight
    AwaitingFinalModel,
    /// Terminal: the answer has been appended
    Answered,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        self == Self::Answered
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingModel => "awaiting_model",
            Self::DirectAnswer => "direct_answer",
            Self::ToolRequested => "tool_requested",
            Self::Dispatching => "dispatching",
            Self::AwaitingFinalModel => "awaiting_final_model",
            Self::Answered => "answered",
        };
        f.write_str(name)
    }
}

/// Events that move a turn forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// A model response arrived; `tool_calls` is how many it carried
    ModelResponded { tool_calls: usize },
    /// Dispatch of the requested tool calls began
    DispatchStarted,
    /// Every tool call has been handled
    DispatchFinished,
    /// The answer message was appended to history
    AnswerRecorded,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid turn transition: {event:?} in state {state}")]
pub struct TransitionError {
    pub state: TurnState,
    pub event: TurnEvent,
}

pub fn transition(state: TurnState, event: TurnEvent) -> Result<TurnState, TransitionError> {
    use TurnEvent as E;
    use TurnState as S;

    match (state, event) {
        (S::AwaitingModel, E::ModelResponded { tool_calls: 0 }) => Ok(S::DirectAnswer),
        (S::AwaitingModel, E::ModelResponded { .. }) => Ok(S::ToolRequested),
        (S::ToolRequested, E::DispatchStarted) => Ok(S::Dispatching),
        (S::Dispatching, E::DispatchFinished) => Ok(S::AwaitingFinalModel),
        // The final call is made without tools; any stray tool calls in its
        // response are not acted on.
        (S::AwaitingFinalModel, E::ModelResponded { .. })
        | (S::DirectAnswer, E::AnswerRecorded) => Ok(S::Answered),
        (state, event) => Err(TransitionError { state, event }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(events: &[TurnEvent]) -> Result<TurnState, TransitionError> {
        events
            .iter()
            .try_fold(TurnState::AwaitingModel, |state, event| transition(state, *event))
    }

    #[test]
    fn test_direct_answer_path() {
        let end = run(&[
            TurnEvent::ModelResponded { tool_calls: 0 },
            TurnEvent::AnswerRecorded,
        ]);
        assert_eq!(end, Ok(TurnState::Answered));
    }

    #[test]
    fn test_tool_path() {
        let end = run(&[
            TurnEvent::ModelResponded { tool_calls: 2 },
            TurnEvent::DispatchStarted,
            TurnEvent::DispatchFinished,
            TurnEvent::ModelResponded { tool_calls: 0 },
        ]);
        assert_eq!(end, Ok(TurnState::Answered));
    }

    #[test]
    fn test_cannot_skip_dispatch() {
        let err = run(&[
            TurnEvent::ModelResponded { tool_calls: 1 },
            TurnEvent::DispatchFinished,
        ])
        .unwrap_err();
        assert_eq!(err.state, TurnState::ToolRequested);
        assert_eq!(err.event, TurnEvent::DispatchFinished);
    }

    #[test]
    fn test_answered_is_terminal() {
        for event in [
            TurnEvent::ModelResponded { tool_calls: 0 },
            TurnEvent::DispatchStarted,
            TurnEvent::DispatchFinished,
            TurnEvent::AnswerRecorded,
        ] {
            assert!(transition(TurnState::Answered, event).is_err());
        }
        assert!(TurnState::Answered.is_terminal());
        assert!(!TurnState::DirectAnswer.is_terminal());
    }

    fn arb_event() -> impl Strategy<Value = TurnEvent> {
        prop_oneof![
            (0usize..3).prop_map(|tool_calls| TurnEvent::ModelResponded { tool_calls }),
            Just(TurnEvent::DispatchStarted),
            Just(TurnEvent::DispatchFinished),
            Just(TurnEvent::AnswerRecorded),
        ]
    }

    proptest! {
        #[test]
        fn prop_any_valid_sequence_is_short(
            events in proptest::collection::vec(arb_event(), 0..10)
        ) {
            // Every legal path reaches Answered in at most four steps and
            // nothing leaves it.
            let mut state = TurnState::AwaitingModel;
            let mut steps = 0;
            for event in events {
                match transition(state, event) {
                    Ok(next) => {
                        state = next;
                        steps += 1;
                    }
                    Err(_) => break,
                }
            }
            prop_assert!(steps <= 4);
            if state.is_terminal() {
                prop_assert!(steps == 2 || steps == 4);
            }
        }
    }
}
