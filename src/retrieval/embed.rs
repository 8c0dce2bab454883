//! Query embedding through Ollama's `/api/embed`
//!
//! Chroma's HTTP query endpoint matches vectors, not text. The query has to
//! be embedded with the same model the collection was built with
//! (all-MiniLM-L6-v2, served by Ollama as `all-minilm`).

use super::{decode, RetrievalError};
use crate::llm::normalize_host;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_EMBED_MODEL: &str = "all-minilm";

/// Embeds one query text per call
pub struct OllamaEmbedder {
    client: Client,
    embed_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: Client, host: &str, model: &str) -> Self {
        Self {
            client,
            embed_url: format!("{}/api/embed", normalize_host(host)),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let response = self
            .client
            .post(&self.embed_url)
            .json(&EmbedRequest {
                model: &self.model,
                input: [text],
            })
            .send()
            .await
            .map_err(|e| {
                RetrievalError::service(format!("Failed to reach embedding model: {e}"))
            })?;
        let body: EmbedResponse = decode(response).await?;
        first_embedding(body)
    }
}

fn first_embedding(body: EmbedResponse) -> Result<Vec<f32>, RetrievalError> {
    body.embeddings
        .into_iter()
        .next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RetrievalError::service("Embedding model returned no vector"))
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embed_url_and_request_shape() {
        let embedder = OllamaEmbedder::new(Client::new(), "gpu-box", DEFAULT_EMBED_MODEL);
        assert_eq!(embedder.embed_url, "http://gpu-box:11434/api/embed");
        assert_eq!(embedder.model(), "all-minilm");

        let body = serde_json::to_value(EmbedRequest {
            model: embedder.model(),
            input: ["Eurasian blackbird"],
        })
        .unwrap();
        assert_eq!(body, json!({"model": "all-minilm", "input": ["Eurasian blackbird"]}));
    }

    #[test]
    fn test_decode_embed_response() {
        let body: EmbedResponse = serde_json::from_value(json!({
            "model": "all-minilm",
            "embeddings": [[0.25, -0.5, 1.0]],
            "total_duration": 14_143_917
        }))
        .unwrap();
        assert_eq!(first_embedding(body), Ok(vec![0.25, -0.5, 1.0]));
    }

    #[test]
    fn test_missing_vector_is_service_error() {
        for value in [json!({}), json!({"embeddings": []}), json!({"embeddings": [[]]})] {
            let body: EmbedResponse = serde_json::from_value(value).unwrap();
            assert!(matches!(first_embedding(body), Err(RetrievalError::Service(_))));
        }
    }
}
