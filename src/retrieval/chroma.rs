//! Chroma vector store client
//!
//! The collection is resolved on the first search and cached, so a store
//! that is down only fails the turns that actually retrieve. Each search
//! after that is one embedding call plus one query round trip.

use super::embed::{OllamaEmbedder, DEFAULT_EMBED_MODEL};
use super::{decode, DocumentSearch, RetrievalError};
use crate::llm::DEFAULT_HOST;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

const DEFAULT_TENANT: &str = "default_tenant";
const DEFAULT_DATABASE: &str = "default_database";

/// Location of the document collection and the model that embeds queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalConfig {
    pub host: String,
    pub port: u16,
    pub collection: String,
    /// Ollama server serving the embedding model
    pub embed_host: String,
    /// Must match the model the collection was ingested with
    pub embed_model: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            collection: "bia_data".to_string(),
            embed_host: DEFAULT_HOST.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
        }
    }
}

impl RetrievalConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("CHROMA_HOST").unwrap_or(defaults.host),
            port: std::env::var("CHROMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            collection: std::env::var("CHROMA_COLLECTION").unwrap_or(defaults.collection),
            embed_host: std::env::var("OLLAMA_HOST").unwrap_or(defaults.embed_host),
            embed_model: std::env::var("BIRD_ID_EMBED_MODEL").unwrap_or(defaults.embed_model),
        }
    }

    fn collections_url(&self) -> String {
        format!(
            "http://{}:{}/api/v2/tenants/{DEFAULT_TENANT}/databases/{DEFAULT_DATABASE}/collections",
            self.host, self.port
        )
    }
}

/// Client for one Chroma collection
pub struct ChromaClient {
    client: Client,
    embedder: OllamaEmbedder,
    collections_url: String,
    collection: String,
    query_url: OnceCell<String>,
}

impl ChromaClient {
    /// Build the client without touching the network
    pub fn new(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .build()
            .map_err(|e| RetrievalError::service(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            embedder: OllamaEmbedder::new(client.clone(), &config.embed_host, &config.embed_model),
            client,
            collections_url: config.collections_url(),
            collection: config.collection.clone(),
            query_url: OnceCell::new(),
        })
    }

    /// Query endpoint of the collection, resolving (creating if needed) it
    /// on first use. A failed resolution is not cached.
    async fn query_url(&self) -> Result<&str, RetrievalError> {
        let url = self
            .query_url
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .post(&self.collections_url)
                    .json(&CreateCollectionRequest {
                        name: &self.collection,
                        get_or_create: true,
                    })
                    .send()
                    .await
                    .map_err(|e| RetrievalError::service(format!("Connection failed: {e}")))?;
                let resolved: CollectionResponse = decode(response).await?;

                tracing::info!(
                    collection = %self.collection,
                    id = %resolved.id,
                    "Connected to document store"
                );
                Ok::<_, RetrievalError>(format!("{}/{}/query", self.collections_url, resolved.id))
            })
            .await?;
        Ok(url.as_str())
    }
}

#[async_trait]
impl DocumentSearch for ChromaClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, RetrievalError> {
        let query_url = self.query_url().await?;
        let embedding = self.embedder.embed(query).await?;

        let response = self
            .client
            .post(query_url)
            .json(&QueryRequest {
                query_embeddings: [embedding],
                n_results: limit,
                include: ["documents"],
            })
            .send()
            .await
            .map_err(|e| RetrievalError::service(format!("Request failed: {e}")))?;
        let body: QueryResponse = decode(response).await?;

        let passages = first_documents(body, limit);
        tracing::debug!(
            collection = %self.collection,
            embed_model = %self.embedder.model(),
            query,
            limit,
            returned = passages.len(),
            "Document search completed"
        );
        Ok(passages)
    }
}

/// Passages for the single query, best first
fn first_documents(body: QueryResponse, limit: usize) -> Vec<String> {
    body.documents
        .and_then(|docs| docs.into_iter().next())
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .take(limit)
        .collect()
}

// Chroma API types

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: [Vec<f32>; 1],
    n_results: usize,
    include: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
}
