//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - DexScreener: rate-limited API client and pair fetcher
//! - Storage: in-memory and JSON file document/connector stores
//! - Enrichment: offline embedder, chunker and summarizer
//! - CLI: Command-line interface definitions

pub mod dexscreener;
pub mod storage;
pub mod enrichment;
pub mod cli;

pub use dexscreener::{DexScreenerClient, DexScreenerConfig, PairFetcher};
pub use storage::{JsonFileStore, MemoryStore};
pub use enrichment::{DisabledSummarizer, HashingEmbedder, MarkdownChunker};
pub use cli::CliApp;
