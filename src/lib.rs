//! PairSync - DexScreener trading pair indexer
//!
//! Fetches trading pairs for configured tokens from the rate-limited
//! DexScreener API and keeps one content-addressed document per pair in a
//! knowledge store, re-indexing idempotently.
//!
//! # Modules
//!
//! - `domain`: Core types (TokenConfig, PairRecord, StoredDocument) and formatting
//! - `ports`: Trait abstractions (PairSource, DocumentStore, Summarizer)
//! - `adapters`: External implementations (DexScreener, storage, enrichment, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Synchronizer and indexing runs

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
