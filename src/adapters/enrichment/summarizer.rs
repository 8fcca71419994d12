//! Summarizer used when no long-context model is configured

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::ports::enrichment::{EnrichmentError, Summarizer, Summary};

/// Always reports "no model"; the synchronizer falls back to the plain-text
/// pair summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(
        &self,
        _user_id: &str,
        _search_space_id: i64,
        _content: &str,
        _metadata: &Map<String, Value>,
    ) -> Result<Option<Summary>, EnrichmentError> {
        Ok(None)
    }
}
