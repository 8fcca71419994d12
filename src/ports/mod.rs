//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Pair data (DexScreener token pairs)
//! - Document and connector storage (transactional session)
//! - Enrichment collaborators (summarizer, embedder, chunker)

pub mod market_data;
pub mod storage;
pub mod enrichment;

pub use market_data::{PairLookup, PairSource};
pub use storage::{ConnectorStore, DocumentStore, IndexStore, SessionStore, StorageError};
pub use enrichment::{Chunker, Embedder, EnrichmentError, Summarizer, Summary};
