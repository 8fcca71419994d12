//! Domain Layer - Pair sync core types and pure logic
//!
//! No I/O here. External interactions happen through the ports layer.
//!
//! - `token`: tracked token configuration and its validation
//! - `pair`: DexScreener pair records, every field optional
//! - `formatter`: deterministic markdown and fallback summary rendering
//! - `document`: stored documents, patches and identity/content hashing
//! - `connector`: connectors owning a token list within a search space

pub mod token;
pub mod pair;
pub mod formatter;
pub mod document;
pub mod connector;

pub use token::{ConnectorConfig, TokenConfig, ValidationError, MAX_TOKENS_PER_CONNECTOR};
pub use pair::{PairRecord, PairsResponse};
pub use formatter::{format_fallback_summary, format_pair_markdown};
pub use document::{
    content_hash, unique_identifier_hash, Chunk, DocumentKind, DocumentPatch, PairMetadata,
    StoredDocument,
};
pub use connector::{Connector, ConnectorId, ConnectorKind};
