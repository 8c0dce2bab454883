//! Document retrieval
//!
//! The only code path that talks to the external document-search service.
//! No caching, retrying or deduplication of results.

mod chroma;
mod embed;

pub use chroma::{ChromaClient, RetrievalConfig};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while retrieving reference passages
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetrievalError {
    /// A recognized tool call carried an argument that could not be coerced
    #[error("invalid retrieval argument '{argument}': {reason}")]
    Argument {
        argument: &'static str,
        reason: String,
    },
    /// The search service failed (network, status or decode)
    #[error("document search failed: {0}")]
    Service(String),
}

impl RetrievalError {
    pub fn argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::Argument {
            argument,
            reason: reason.into(),
        }
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }
}

/// Ranked text search over the reference corpus
#[async_trait]
pub trait DocumentSearch: Send + Sync {
    /// Return up to `limit` passages, best match first. An empty result is
    /// not an error.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, RetrievalError>;
}

/// Read a JSON body, turning a non-2xx status into a service error.
///
/// Chroma and Ollama both report failures as `{"error": ...}`.
async fn decode<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, RetrievalError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RetrievalError::service(format!("Failed to read response: {e}")))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ServiceErrorResponse>(&body)
            .map_or(body, |resp| resp.message.unwrap_or(resp.error));
        return Err(RetrievalError::service(format!("HTTP {status}: {message}")));
    }

    serde_json::from_str(&body).map_err(|e| {
        RetrievalError::service(format!("Failed to parse response: {e} - body: {body}"))
    })
}

#[derive(Debug, Deserialize)]
struct ServiceErrorResponse {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

/// Coerce a raw result-count argument into a positive integer.
///
/// Accepts JSON integers and numeric text, since small models often send
/// counts as strings.
pub fn coerce_limit(raw: &Value) -> Result<usize, RetrievalError> {
    const ARG: &str = "n_results";

    let limit = match raw {
        Value::Number(n) => n.as_u64().ok_or_else(|| {
            RetrievalError::argument(ARG, format!("{n} is not a non-negative integer"))
        })?,
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| RetrievalError::argument(ARG, format!("'{s}' is not an integer")))?,
        other => {
            return Err(RetrievalError::argument(
                ARG,
                format!("expected an integer, got {other}"),
            ))
        }
    };

    if limit == 0 {
        return Err(RetrievalError::argument(ARG, "must be at least 1"));
    }
    usize::try_from(limit)
        .map_err(|_| RetrievalError::argument(ARG, format!("{limit} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce_limit(&json!(3)), Ok(3));
    }

    #[test]
    fn test_coerce_numeric_text() {
        assert_eq!(coerce_limit(&json!("3")), Ok(3));
        assert_eq!(coerce_limit(&json!(" 2 ")), Ok(2));
    }

    #[test]
    fn test_coerce_rejects_words() {
        let err = coerce_limit(&json!("two")).unwrap_err();
        assert!(matches!(err, RetrievalError::Argument { argument: "n_results", .. }));
        assert!(err.to_string().contains("'two' is not an integer"));
    }

    #[test]
    fn test_coerce_rejects_zero_negative_fraction_and_other_types() {
        assert!(coerce_limit(&json!(0)).is_err());
        assert!(coerce_limit(&json!("0")).is_err());
        assert!(coerce_limit(&json!(-1)).is_err());
        assert!(coerce_limit(&json!("-1")).is_err());
        assert!(coerce_limit(&json!(2.5)).is_err());
        assert!(coerce_limit(&json!(null)).is_err());
        assert!(coerce_limit(&json!(true)).is_err());
        assert!(coerce_limit(&json!([2])).is_err());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            RetrievalError::service("connection refused").to_string(),
            "document search failed: connection refused"
        );
    }

    proptest! {
        #[test]
        fn prop_text_and_number_agree(n in 1u32..10_000) {
            prop_assert_eq!(
                coerce_limit(&json!(n.to_string())),
                coerce_limit(&json!(n))
            );
        }

        #[test]
        fn prop_non_numeric_text_rejected(s in "[a-zA-Z][a-zA-Z ]{0,10}") {
            prop_assert!(coerce_limit(&json!(s)).is_err());
        }
    }
}
