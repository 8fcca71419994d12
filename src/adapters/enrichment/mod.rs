//! Enrichment Adapters
//!
//! Offline implementations of the Summarizer, Embedder and Chunker ports.

mod chunker;
mod embedder;
mod summarizer;

pub use chunker::{MarkdownChunker, DEFAULT_MAX_CHARS};
pub use embedder::{HashingEmbedder, DEFAULT_DIMENSIONS};
pub use summarizer::DisabledSummarizer;
