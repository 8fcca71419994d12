//! Markdown chunker
//!
//! Splits a pair report at `## ` headings, then packs paragraphs of any
//! section longer than `max_chars` into several chunks. Every chunk is
//! embedded with the injected [`Embedder`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::document::Chunk;
use crate::ports::enrichment::{Chunker, Embedder, EnrichmentError};

pub const DEFAULT_MAX_CHARS: usize = 1_000;

pub struct MarkdownChunker {
    embedder: Arc<dyn Embedder>,
    max_chars: usize,
}

impl MarkdownChunker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }

    /// Text pieces only, before embedding
    pub fn split(&self, content: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        for section in sections(content) {
            if section.chars().count() <= self.max_chars {
                pieces.push(section);
            } else {
                pieces.extend(pack_paragraphs(&section, self.max_chars));
            }
        }
        pieces
    }
}

/// Sections start at each `## ` line; anything before the first is its own
/// section
fn sections(content: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if line.starts_with("## ") && !current.trim().is_empty() {
            sections.push(current.trim().to_string());
            current.clear();
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        sections.push(current.trim().to_string());
    }
    sections
}

fn pack_paragraphs(section: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in section.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let needed = current.chars().count() + paragraph.chars().count() + 2;
        if !current.is_empty() && needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl Chunker for MarkdownChunker {
    async fn chunk(&self, content: &str) -> Result<Vec<Chunk>, EnrichmentError> {
        let mut chunks = Vec::new();
        for piece in self.split(content) {
            let embedding = self
                .embedder
                .embed(&piece)
                .await
                .map_err(|e| EnrichmentError::Chunking(e.to_string()))?;
            chunks.push(Chunk {
                content: piece,
                embedding,
            });
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::enrichment::HashingEmbedder;
    use crate::ports::enrichment::MockEmbedder;

    const REPORT: &str = "# WETH/USDC Trading Pair\n\n\
        - **Chain:** ethereum\n\
        - **DEX:** uniswap\n\n\
        ## Price Information\n\
        - **Price USD:** $3500.12\n\n\
        ## Liquidity\n\
        - **Total Liquidity:** $1,000,000.00\n";

    fn chunker() -> MarkdownChunker {
        MarkdownChunker::new(Arc::new(HashingEmbedder::new(16).unwrap()))
    }

    #[test]
    fn test_split_by_heading() {
        let pieces = chunker().split(REPORT);
        assert_eq!(pieces.len(), 3);
        assert!(pieces[0].starts_with("# WETH/USDC"));
        assert!(pieces[1].starts_with("## Price Information"));
        assert!(pieces[2].starts_with("## Liquidity"));
    }

    #[test]
    fn test_long_section_packed_by_paragraph() {
        let section = format!("## Notes\n\n{}\n\n{}\n\n{}", "a".repeat(40), "b".repeat(40), "c".repeat(40));
        let pieces = chunker().with_max_chars(90).split(&section);

        assert_eq!(pieces.len(), 2);
        assert!(pieces.iter().all(|p| p.chars().count() <= 90));
        assert!(pieces[0].starts_with("## Notes"));
        assert!(pieces[1].starts_with('b'));
    }

    #[test]
    fn test_blank_content_has_no_chunks() {
        assert!(chunker().split("\n  \n").is_empty());
    }

    #[tokio::test]
    async fn test_chunks_are_embedded() {
        let chunks = chunker().chunk(REPORT).await.unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.embedding.len() == 16));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_chunking_error() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .returning(|_| Err(EnrichmentError::Embedding("model offline".into())));

        let err = MarkdownChunker::new(Arc::new(embedder))
            .chunk(REPORT)
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Chunking(_)));
    }
}
