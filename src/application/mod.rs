//! Application Layer
//!
//! Use cases built on the ports: synchronizing one pair into the store and
//! running a full indexing pass for a connector.

pub mod indexer;
pub mod run_guard;
pub mod synchronizer;

pub use indexer::{IndexingOutcome, IndexingStats, PairIndexer, DEFAULT_BATCH_SIZE};
pub use run_guard::{RunGuard, RunPermit};
pub use synchronizer::{DocumentSynchronizer, SkipReason, SyncError, SyncOutcome, SyncTarget};
