//! Pair Indexer
//!
//! Drives one indexing run for a connector: load its tokens, fetch the
//! pairs of each token, synchronize every pair, and commit in batches.
//!
//! Failures are isolated per token (bad config, fetch error) and per pair
//! (processing error or panic). A storage error is not: it rolls back the
//! open batch and aborts the run. Batches committed earlier stay durable.
//!
//! Each run works in its own store session, so runs for different
//! connectors never commit or discard each other's writes.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tracing::Instrument;

use crate::domain::connector::{ConnectorId, ConnectorKind};
use crate::ports::market_data::PairSource;
use crate::ports::storage::{IndexStore, SessionStore, StorageError};

use super::run_guard::RunGuard;
use super::synchronizer::{DocumentSynchronizer, SkipReason, SyncError, SyncOutcome, SyncTarget};

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Counters reported alongside the primary `(documents_indexed, error)` result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingStats {
    pub documents_indexed: usize,
    pub documents_created: usize,
    pub documents_updated: usize,
    pub documents_skipped: usize,
    pub documents_unchanged: usize,
    pub tokens_processed: usize,
    /// Label and reason of every token that was not indexed
    pub skipped_tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingOutcome {
    pub documents_indexed: usize,
    pub error: Option<String>,
    pub stats: IndexingStats,
}

impl IndexingOutcome {
    fn success(stats: IndexingStats) -> Self {
        Self {
            documents_indexed: stats.documents_indexed,
            error: None,
            stats,
        }
    }

    fn failure(message: String, stats: IndexingStats) -> Self {
        Self {
            documents_indexed: 0,
            error: Some(message),
            stats,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// `(documents_indexed, error)`
    pub fn into_tuple(self) -> (usize, Option<String>) {
        (self.documents_indexed, self.error)
    }
}

/// Why a run stopped early
#[derive(Debug)]
enum RunError {
    ConnectorNotFound(ConnectorId),
    NoTokens,
    Storage(StorageError),
}

impl From<StorageError> for RunError {
    fn from(err: StorageError) -> Self {
        RunError::Storage(err)
    }
}

#[derive(Clone)]
pub struct PairIndexer {
    source: Arc<dyn PairSource>,
    store: Arc<dyn SessionStore>,
    synchronizer: DocumentSynchronizer,
    batch_size: usize,
    guard: RunGuard,
}

impl PairIndexer {
    pub fn new(
        source: Arc<dyn PairSource>,
        store: Arc<dyn SessionStore>,
        synchronizer: DocumentSynchronizer,
    ) -> Self {
        Self {
            source,
            store,
            synchronizer,
            batch_size: DEFAULT_BATCH_SIZE,
            guard: RunGuard::new(),
        }
    }

    /// Commit every `batch_size` indexed documents (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Share a guard with other indexers over the same store
    pub fn with_run_guard(mut self, guard: RunGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn run_guard(&self) -> &RunGuard {
        &self.guard
    }

    /// Index every pair of every token configured on the connector.
    ///
    /// Always returns a count and an optional error; skipped tokens and pairs
    /// are reported in [`IndexingStats`], not as errors.
    pub async fn run(
        &self,
        connector_id: ConnectorId,
        search_space_id: i64,
        user_id: &str,
        update_last_indexed: bool,
    ) -> IndexingOutcome {
        let span = tracing::info_span!("index_run", connector_id, search_space_id);

        async move {
            let Some(_permit) = self.guard.try_acquire(connector_id) else {
                tracing::warn!(error_type = "AlreadyRunning", "Indexing already in progress");
                return IndexingOutcome::failure(
                    format!("Indexing already in progress for connector {}", connector_id),
                    IndexingStats::default(),
                );
            };

            tracing::info!("Starting DexScreener indexing");

            // Run on its own task so a panic outside the pair loop surfaces
            // as a JoinError instead of unwinding through the caller
            let this = self.clone();
            let user_id = user_id.to_string();
            let handle = tokio::spawn(
                async move {
                    let mut stats = IndexingStats::default();
                    let result = this
                        .index_in_session(
                            connector_id,
                            search_space_id,
                            &user_id,
                            update_last_indexed,
                            &mut stats,
                        )
                        .await;
                    (result, stats)
                }
                .in_current_span(),
            );

            match handle.await {
                Ok((Ok(()), stats)) => {
                    tracing::info!(
                        documents_indexed = stats.documents_indexed,
                        documents_skipped = stats.documents_skipped,
                        tokens_processed = stats.tokens_processed,
                        "Successfully completed DexScreener indexing"
                    );
                    IndexingOutcome::success(stats)
                }
                Ok((Err(err), stats)) => fail(err, stats),
                Err(join_err) => {
                    // The session died with the task; its staged writes are gone
                    let cause = if join_err.is_panic() {
                        panic_message(join_err.into_panic())
                    } else {
                        join_err.to_string()
                    };
                    tracing::error!(error_type = "UnexpectedError", "Indexing failed: {}", cause);
                    IndexingOutcome::failure(
                        format!("Unexpected error: {}", cause),
                        IndexingStats::default(),
                    )
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Open a session for the run and roll it back on a storage error
    async fn index_in_session(
        &self,
        connector_id: ConnectorId,
        search_space_id: i64,
        user_id: &str,
        update_last_indexed: bool,
        stats: &mut IndexingStats,
    ) -> Result<(), RunError> {
        let session = self.store.begin().await?;
        let result = self
            .index(
                session.as_ref(),
                connector_id,
                search_space_id,
                user_id,
                update_last_indexed,
                stats,
            )
            .await;

        if let Err(RunError::Storage(_)) = &result {
            if let Err(e) = session.rollback().await {
                tracing::error!("Rollback failed: {}", e);
            }
        }
        result
    }

    async fn index(
        &self,
        session: &dyn IndexStore,
        connector_id: ConnectorId,
        search_space_id: i64,
        user_id: &str,
        update_last_indexed: bool,
        stats: &mut IndexingStats,
    ) -> Result<(), RunError> {
        let connector = session
            .get_connector(connector_id, ConnectorKind::DexscreenerConnector)
            .await?
            .ok_or(RunError::ConnectorNotFound(connector_id))?;
        tracing::debug!(connector_name = connector.name.as_str(), "Retrieved connector");

        let tokens = connector.config.tokens;
        if tokens.is_empty() {
            return Err(RunError::NoTokens);
        }

        let total = tokens.len();
        let mut pending = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            if !token.is_indexable() {
                tracing::warn!(
                    chain = token.chain.as_str(),
                    address = token.address.as_str(),
                    "Skipping token with missing chain or address"
                );
                stats
                    .skipped_tokens
                    .push(format!("{} (missing chain or address)", token.label()));
                continue;
            }

            tracing::info!(
                "Fetching pairs for token {}/{}: {} on {}",
                i + 1,
                total,
                token.label(),
                token.chain
            );

            let (pairs, error) = self
                .source
                .get_pairs(&token.chain, &token.address)
                .await
                .into_parts();

            if let Some(error) = error {
                tracing::warn!(token = token.label(), "Skipping token: {}", error);
                stats.skipped_tokens.push(format!("{} ({})", token.label(), error));
                continue;
            }

            stats.tokens_processed += 1;
            tracing::info!(token = token.label(), "Found {} pairs", pairs.len());

            let target = SyncTarget {
                search_space_id,
                user_id,
                token,
            };

            for pair in &pairs {
                let synced = AssertUnwindSafe(self.synchronizer.sync_pair(session, target, pair))
                    .catch_unwind()
                    .await;

                match synced {
                    Ok(Ok(SyncOutcome::Created)) => stats.documents_created += 1,
                    Ok(Ok(SyncOutcome::Updated)) => stats.documents_updated += 1,
                    Ok(Ok(SyncOutcome::Skipped(reason))) => {
                        stats.documents_skipped += 1;
                        if reason == SkipReason::Unchanged {
                            stats.documents_unchanged += 1;
                        }
                        continue;
                    }
                    Ok(Err(SyncError::Processing(cause))) => {
                        tracing::warn!(
                            pair_address = pair.address().unwrap_or_default(),
                            "Error processing pair: {}",
                            cause
                        );
                        stats.documents_skipped += 1;
                        continue;
                    }
                    Ok(Err(SyncError::Storage(err))) => return Err(RunError::Storage(err)),
                    Err(payload) => {
                        tracing::error!(
                            pair_address = pair.address().unwrap_or_default(),
                            error_type = "UnexpectedError",
                            "Panic while processing pair: {}",
                            panic_message(payload)
                        );
                        stats.documents_skipped += 1;
                        continue;
                    }
                }

                stats.documents_indexed += 1;
                pending += 1;

                if stats.documents_indexed % self.batch_size == 0 {
                    session.commit().await?;
                    pending = 0;
                    tracing::info!(
                        "Committed batch of {} documents ({} total)",
                        self.batch_size,
                        stats.documents_indexed
                    );
                }
            }
        }

        if pending > 0 {
            session.commit().await?;
            tracing::info!("Committed final batch of {} documents", pending);
        }

        if update_last_indexed {
            session.set_last_indexed(connector_id, Utc::now()).await?;
            session.commit().await?;
            tracing::debug!("Updated last indexed timestamp");
        }

        Ok(())
    }

}

fn fail(err: RunError, stats: IndexingStats) -> IndexingOutcome {
    let (error_type, message) = match err {
        RunError::ConnectorNotFound(id) => (
            "ConnectorNotFound",
            format!(
                "Connector with ID {} not found or is not a DexScreener connector",
                id
            ),
        ),
        RunError::NoTokens => (
            "MissingConfiguration",
            "No tokens configured for connector".to_string(),
        ),
        RunError::Storage(e) => ("DatabaseError", format!("Database error: {}", e)),
    };

    tracing::error!(error_type, "Indexing failed: {}", message);
    IndexingOutcome::failure(message, stats)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
