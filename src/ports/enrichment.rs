//! Enrichment Ports
//!
//! External collaborators that turn a document body into searchable form:
//! a long-context summarizer, an embedding model and a chunker. All are
//! injected; nothing reaches into process-wide state.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::document::Chunk;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnrichmentError {
    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Chunking failed: {0}")]
    Chunking(String),
}

/// Summary text plus the embedding of that summary
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub content: String,
    pub embedding: Vec<f32>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `content` for the given user and search space.
    ///
    /// `Ok(None)` means no long-context model is available; callers fall back
    /// to a plain-text summary.
    async fn summarize(
        &self,
        user_id: &str,
        search_space_id: i64,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> Result<Option<Summary>, EnrichmentError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EnrichmentError>;
}

#[async_trait]
pub trait Chunker: Send + Sync {
    async fn chunk(&self, content: &str) -> Result<Vec<Chunk>, EnrichmentError>;
}
