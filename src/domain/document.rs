//! Stored Documents
//!
//! A [`StoredDocument`] is the unit written to the knowledge store, one per
//! `(search_space_id, unique_identifier_hash)`. Changes are expressed as a
//! [`DocumentPatch`] and merged with [`StoredDocument::apply`] so the update
//! path can be tested without a live store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use super::formatter::{NOT_AVAILABLE, UNKNOWN};
use super::pair::PairRecord;
use super::token::TokenConfig;

/// Source name used in document titles
pub const SOURCE_NAME: &str = "DexScreener";

/// Kind of document; part of the identity hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    DexscreenerConnector,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::DexscreenerConnector => "DEXSCREENER_CONNECTOR",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `sha256("{kind}:{identifier}:{search_space_id}")` as lowercase hex
pub fn unique_identifier_hash(kind: DocumentKind, identifier: &str, search_space_id: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", kind.as_str(), identifier, search_space_id).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `sha256("{search_space_id}:{content}")` as lowercase hex
pub fn content_hash(content: &str, search_space_id: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", search_space_id, content).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stable identity of a pair: `{chain}:{pair_address}`
pub fn pair_identifier(chain: &str, pair_address: &str) -> String {
    format!("{}:{}", chain, pair_address)
}

/// One chunk of a document body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub search_space_id: i64,
    pub kind: DocumentKind,
    pub unique_identifier_hash: String,
    pub content_hash: String,
    pub title: String,
    /// Summary text (LLM or fallback), not the raw markdown
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Map<String, Value>,
    pub chunks: Vec<Chunk>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Target state of the mutable fields of a document.
///
/// Identity (`unique_identifier_hash`, `search_space_id`, `kind`) and
/// `created_at` are never part of a patch.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPatch {
    pub title: String,
    pub content: String,
    pub content_hash: String,
    pub embedding: Vec<f32>,
    pub metadata: Map<String, Value>,
    pub chunks: Vec<Chunk>,
}

impl StoredDocument {
    /// Build a new document from a patch
    pub fn create(
        search_space_id: i64,
        kind: DocumentKind,
        unique_identifier_hash: String,
        patch: DocumentPatch,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            search_space_id,
            kind,
            unique_identifier_hash,
            content_hash: patch.content_hash,
            title: patch.title,
            content: patch.content,
            embedding: patch.embedding,
            metadata: patch.metadata,
            chunks: patch.chunks,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a patch in place, bumping `updated_at`
    pub fn apply(&mut self, patch: DocumentPatch, now: DateTime<Utc>) {
        self.title = patch.title;
        self.content = patch.content;
        self.content_hash = patch.content_hash;
        self.embedding = patch.embedding;
        self.metadata = patch.metadata;
        self.chunks = patch.chunks;
        self.updated_at = now;
    }
}

/// Flattened pair fields shared by document metadata, summarizer metadata and
/// the document title
#[derive(Debug, Clone, PartialEq)]
pub struct PairMetadata {
    pub pair_address: String,
    pub chain: String,
    pub dex: String,
    pub base_symbol: String,
    pub quote_symbol: String,
    pub price_usd: String,
    pub liquidity_usd: f64,
    pub volume_24h: f64,
    pub price_change_24h: f64,
}

impl PairMetadata {
    /// `chain` is the tracked token's configured chain
    pub fn from_pair(pair: &PairRecord, pair_address: &str, chain: &str) -> Self {
        Self {
            pair_address: pair_address.to_string(),
            chain: chain.to_string(),
            dex: pair.dex_id.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            base_symbol: pair.base_symbol().unwrap_or(UNKNOWN).to_string(),
            quote_symbol: pair.quote_symbol().unwrap_or(UNKNOWN).to_string(),
            price_usd: pair
                .price_usd
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            liquidity_usd: pair.liquidity_usd().unwrap_or(0.0),
            volume_24h: pair.volume_24h().unwrap_or(0.0),
            price_change_24h: pair.price_change_24h().unwrap_or(0.0),
        }
    }

    /// `"DexScreener - BASE/QUOTE on chain"`
    pub fn title(&self) -> String {
        format!(
            "{} - {}/{} on {}",
            SOURCE_NAME, self.base_symbol, self.quote_symbol, self.chain
        )
    }

    fn base_map(&self) -> Map<String, Value> {
        let value = json!({
            "pair_address": self.pair_address,
            "chain_id": self.chain,
            "dex": self.dex,
            "base_symbol": self.base_symbol,
            "quote_symbol": self.quote_symbol,
            "price_usd": self.price_usd,
            "liquidity_usd": self.liquidity_usd,
            "volume_24h": self.volume_24h,
            "price_change_24h": self.price_change_24h,
        });
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Bundle handed to the long-context summarizer
    pub fn summarizer_metadata(&self) -> Map<String, Value> {
        let mut map = self.base_map();
        map.insert("document_type".into(), json!("DexScreener Trading Pair"));
        map.insert("connector_type".into(), json!(SOURCE_NAME));
        map
    }

    /// Metadata persisted on the document
    pub fn document_metadata(&self, token: &TokenConfig) -> Map<String, Value> {
        let mut map = self.base_map();
        map.insert(
            "token_name".into(),
            json!(token.name.clone().unwrap_or_default()),
        );
        map.insert("token_address".into(), json!(token.address));
        map
    }
}
