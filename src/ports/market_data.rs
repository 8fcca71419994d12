//! Pair Source Port
//!
//! Abstraction over "give me the trading pairs of this token". The fetch
//! never fails with an error type: soft conditions (not found, no pairs) and
//! hard failures are both values of [`PairLookup`], so callers decide what to
//! skip and nothing propagates out of a single token's fetch.

use async_trait::async_trait;

use crate::domain::pair::PairRecord;

/// Outcome of fetching the pairs of one token
#[derive(Debug, Clone, PartialEq)]
pub enum PairLookup {
    /// At least one pair was returned
    Found(Vec<PairRecord>),
    /// Token unknown upstream, or known but without pairs
    Empty(String),
    /// Terminal client error after retries
    Failed(String),
}

impl PairLookup {
    /// Collapse into the `(pairs, error)` shape: soft and hard errors both
    /// yield an empty list with a message.
    pub fn into_parts(self) -> (Vec<PairRecord>, Option<String>) {
        match self {
            PairLookup::Found(pairs) => (pairs, None),
            PairLookup::Empty(reason) | PairLookup::Failed(reason) => (Vec::new(), Some(reason)),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PairLookup::Found(_))
    }
}

/// Source of trading pairs for a `(chain, token address)`
#[async_trait]
pub trait PairSource: Send + Sync {
    async fn get_pairs(&self, chain: &str, address: &str) -> PairLookup;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_parts() {
        let (pairs, err) = PairLookup::Found(vec![PairRecord::default()]).into_parts();
        assert_eq!(pairs.len(), 1);
        assert!(err.is_none());

        let (pairs, err) = PairLookup::Empty("Token not found: a/b".into()).into_parts();
        assert!(pairs.is_empty());
        assert_eq!(err.as_deref(), Some("Token not found: a/b"));

        let (pairs, err) = PairLookup::Failed("boom".into()).into_parts();
        assert!(pairs.is_empty());
        assert_eq!(err.as_deref(), Some("boom"));
    }
}
