//! Document Synchronizer
//!
//! Decides, per pair, whether the stored document must be created, updated
//! or left alone:
//!
//! 1. A pair without an address is skipped before anything is hashed.
//! 2. The pair is rendered to markdown and hashed twice: identity
//!    (`kind`, `chain:pair_address`, search space) and content (markdown,
//!    search space).
//! 3. An existing document with the same content hash is left untouched.
//! 4. Otherwise the summary comes from the long-context summarizer, or from
//!    the plain-text fallback plus the embedder when no model is available.
//!    The markdown is chunked and the result is staged as an insert or as a
//!    patch over the existing document.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::domain::document::{
    content_hash, pair_identifier, unique_identifier_hash, DocumentKind, DocumentPatch,
    PairMetadata, StoredDocument,
};
use crate::domain::formatter::{format_fallback_summary, format_pair_markdown};
use crate::domain::pair::PairRecord;
use crate::domain::token::TokenConfig;
use crate::ports::enrichment::{Chunker, Embedder, EnrichmentError, Summarizer, Summary};
use crate::ports::storage::{DocumentStore, StorageError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    /// Store failure; aborts the whole run
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Failure confined to one pair; the pair is skipped
    #[error("{0}")]
    Processing(String),
}

impl From<EnrichmentError> for SyncError {
    fn from(err: EnrichmentError) -> Self {
        SyncError::Processing(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingPairAddress,
    EmptyContent,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Skipped(SkipReason),
}

impl SyncOutcome {
    /// Created or updated
    pub fn is_indexed(&self) -> bool {
        matches!(self, SyncOutcome::Created | SyncOutcome::Updated)
    }
}

/// Where a pair is being synchronized to, and on whose behalf
#[derive(Debug, Clone, Copy)]
pub struct SyncTarget<'a> {
    pub search_space_id: i64,
    pub user_id: &'a str,
    pub token: &'a TokenConfig,
}

#[derive(Clone)]
pub struct DocumentSynchronizer {
    summarizer: Arc<dyn Summarizer>,
    embedder: Arc<dyn Embedder>,
    chunker: Arc<dyn Chunker>,
    kind: DocumentKind,
}

impl DocumentSynchronizer {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        embedder: Arc<dyn Embedder>,
        chunker: Arc<dyn Chunker>,
    ) -> Self {
        Self {
            summarizer,
            embedder,
            chunker,
            kind: DocumentKind::DexscreenerConnector,
        }
    }

    /// Synchronize one pair into `store`. Writes are staged, never committed.
    pub async fn sync_pair<S>(
        &self,
        store: &S,
        target: SyncTarget<'_>,
        pair: &PairRecord,
    ) -> Result<SyncOutcome, SyncError>
    where
        S: DocumentStore + ?Sized,
    {
        let Some(pair_address) = pair.address() else {
            tracing::warn!(token = target.token.label(), "Skipping pair without pair address");
            return Ok(SyncOutcome::Skipped(SkipReason::MissingPairAddress));
        };

        let markdown = format_pair_markdown(pair, target.token.display_name());
        if markdown.trim().is_empty() {
            tracing::warn!(pair_address, "Skipping pair with empty content");
            return Ok(SyncOutcome::Skipped(SkipReason::EmptyContent));
        }

        let chain = target.token.chain.as_str();
        let space = target.search_space_id;
        let uid = unique_identifier_hash(self.kind, &pair_identifier(chain, pair_address), space);
        let hash = content_hash(&markdown, space);

        let existing = store.find_by_identifier(space, &uid).await?;
        if let Some(doc) = &existing {
            if doc.content_hash == hash {
                tracing::debug!(pair_address, chain, "Pair unchanged, skipping");
                return Ok(SyncOutcome::Skipped(SkipReason::Unchanged));
            }
        }

        let meta = PairMetadata::from_pair(pair, pair_address, chain);
        let summary = self.summarize(target, pair, &markdown, &meta).await?;
        let chunks = self.chunker.chunk(&markdown).await?;

        let patch = DocumentPatch {
            title: meta.title(),
            content: summary.content,
            content_hash: hash,
            embedding: summary.embedding,
            metadata: meta.document_metadata(target.token),
            chunks,
        };
        let now = Utc::now();

        match existing {
            Some(mut doc) => {
                doc.apply(patch, now);
                store.update(doc).await?;
                tracing::info!(pair_address, chain, "Updated document");
                Ok(SyncOutcome::Updated)
            }
            None => {
                let title = patch.title.clone();
                store
                    .insert(StoredDocument::create(space, self.kind, uid, patch, now))
                    .await?;
                tracing::info!(pair_address, chain, "Created document: {}", title);
                Ok(SyncOutcome::Created)
            }
        }
    }

    async fn summarize(
        &self,
        target: SyncTarget<'_>,
        pair: &PairRecord,
        markdown: &str,
        meta: &PairMetadata,
    ) -> Result<Summary, SyncError> {
        let summary = self
            .summarizer
            .summarize(
                target.user_id,
                target.search_space_id,
                markdown,
                &meta.summarizer_metadata(),
            )
            .await?;

        if let Some(summary) = summary {
            return Ok(summary);
        }

        tracing::debug!(
            pair_address = meta.pair_address.as_str(),
            "No long-context model, using fallback summary"
        );
        let content = format_fallback_summary(pair, &target.token.chain);
        let embedding = self.embedder.embed(&content).await?;
        Ok(Summary { content, embedding })
    }
}
