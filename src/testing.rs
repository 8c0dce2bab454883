//! Mock implementations for testing
//!
//! These mocks stand in for the model and vector-store services so the
//! engine can be exercised without real I/O.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::retrieval::{DocumentSearch, RetrievalError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Mock Document Search
// ============================================================================

/// In-memory corpus keyed by title.
///
/// A query matches every document whose title contains it
/// (case-insensitive), in insertion order.
#[derive(Default)]
pub struct MockDocumentSearch {
    documents: Vec<(String, String)>,
    failures: Mutex<VecDeque<RetrievalError>>,
    /// Record of (query, limit) pairs
    queries: Mutex<Vec<(String, usize)>>,
}

impl MockDocumentSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, title: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.push((title.into(), text.into()));
        self
    }

    /// Make the next search fail with `error`
    pub fn fail_next(&self, error: RetrievalError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn recorded_queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSearch for MockDocumentSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, RetrievalError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), limit));
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let needle = query.to_lowercase();
        Ok(self
            .documents
            .iter()
            .filter(|(title, _)| title.to_lowercase().contains(&needle))
            .map(|(_, text)| text.clone())
            .take(limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> MockDocumentSearch {
        MockDocumentSearch::new()
            .with_document("Eurasian blackbird", "Blackbird passage one.")
            .with_document("Eurasian blackbird", "Blackbird passage two.")
            .with_document("European robin", "Robin passage.")
    }

    #[tokio::test]
    async fn test_search_is_repeatable() {
        let search = corpus();
        let first = search.search("Eurasian blackbird", 2).await.unwrap();
        let second = search.search("Eurasian blackbird", 2).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec!["Blackbird passage one.", "Blackbird passage two."]);
    }

    #[tokio::test]
    async fn test_search_respects_limit_and_empty_results() {
        let search = corpus();
        assert_eq!(search.search("blackbird", 1).await.unwrap().len(), 1);
        assert!(search.search("albatross", 3).await.unwrap().is_empty());
    }
}
