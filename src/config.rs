//! Process configuration
//!
//! Environment variables provide defaults; command-line flags override them.

use crate::llm::LlmConfig;
use crate::retrieval::RetrievalConfig;

/// Everything needed to reach the two external services
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantConfig {
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
}

/// Optional values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ollama_host: Option<String>,
    pub model: Option<String>,
    pub embed_model: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub collection: Option<String>,
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        Self {
            llm: LlmConfig::from_env(),
            retrieval: RetrievalConfig::from_env(),
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        // One Ollama server serves both the chat and the embedding model
        if let Some(host) = overrides.ollama_host {
            self.retrieval.embed_host.clone_from(&host);
            self.llm.host = host;
        }
        if let Some(model) = overrides.model {
            self.llm.model = model;
        }
        if let Some(model) = overrides.embed_model {
            self.retrieval.embed_model = model;
        }
        if let Some(host) = overrides.host {
            self.retrieval.host = host;
        }
        if let Some(port) = overrides.port {
            self.retrieval.port = port;
        }
        if let Some(collection) = overrides.collection {
            self.retrieval.collection = collection;
        }
        self
    }
}
