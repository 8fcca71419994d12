//! Feature-hashing embedder
//!
//! Deterministic, offline embedding: each lowercase word is hashed with
//! SHA-256 into one of `dimensions` buckets with a signed weight, and the
//! resulting vector is L2-normalized. Identical text always yields the same
//! vector, which keeps re-runs over unchanged pairs stable.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::ports::enrichment::{Embedder, EnrichmentError};

pub const DEFAULT_DIMENSIONS: usize = 256;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, EnrichmentError> {
        if dimensions == 0 {
            return Err(EnrichmentError::Embedding(
                "embedding dimensions must be > 0".into(),
            ));
        }
        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let words = text
            .split(|c: char| !c.is_alphanumeric() && c != '.' && c != '$')
            .map(|w| w.trim_matches('.'))
            .filter(|w| !w.is_empty());

        for word in words {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let index = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EnrichmentError> {
        Ok(self.vectorize(text))
    }
}
