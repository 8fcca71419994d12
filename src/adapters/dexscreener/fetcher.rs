//! Pair Fetcher
//!
//! Domain wrapper over [`DexScreenerClient`]: `tokens/{chain}/{address}` to a
//! [`PairLookup`]. Client errors are folded into the lookup; nothing escapes.

use async_trait::async_trait;

use crate::domain::pair::PairsResponse;
use crate::ports::market_data::{PairLookup, PairSource};

use super::client::{ApiResponse, DexScreenerClient, HttpTransport, ReqwestTransport};
use super::error::ClientError;

#[derive(Debug, Clone)]
pub struct PairFetcher<T = ReqwestTransport> {
    client: DexScreenerClient<T>,
}

impl<T: HttpTransport> PairFetcher<T> {
    pub fn new(client: DexScreenerClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DexScreenerClient<T> {
        &self.client
    }

    async fn fetch_pairs(&self, chain: &str, address: &str) -> Result<PairLookup, ClientError> {
        let endpoint = format!("tokens/{}/{}", chain, address);

        let body = match self.client.fetch(&endpoint).await? {
            ApiResponse::Found(body) => body,
            ApiResponse::NotFound => {
                return Ok(PairLookup::Empty(format!(
                    "Token not found: {}/{}",
                    chain, address
                )))
            }
        };

        let response: PairsResponse = serde_json::from_value(body)?;

        if response.pairs.is_empty() {
            return Ok(PairLookup::Empty(format!(
                "No trading pairs found for {}/{}",
                chain, address
            )));
        }

        Ok(PairLookup::Found(response.pairs))
    }
}

#[async_trait]
impl<T: HttpTransport> PairSource for PairFetcher<T> {
    async fn get_pairs(&self, chain: &str, address: &str) -> PairLookup {
        match self.fetch_pairs(chain, address).await {
            Ok(lookup) => lookup,
            Err(e) => PairLookup::Failed(format!(
                "Error fetching pairs for {}/{}: {}",
                chain, address, e
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dexscreener::client::{DexScreenerConfig, HttpResponse};
    use reqwest::StatusCode;
    use std::time::Duration;

    /// Always answers with the same status and body
    struct FixedTransport {
        status: StatusCode,
        body: &'static str,
    }

    #[async_trait]
    impl HttpTransport for FixedTransport {
        async fn get(&self, _url: &str) -> Result<HttpResponse, ClientError> {
            Ok(HttpResponse::new(self.status, self.body))
        }
    }

    fn fetcher(status: StatusCode, body: &'static str) -> PairFetcher<FixedTransport> {
        let config = DexScreenerConfig {
            rate_limit_delay: Duration::ZERO,
            backoff_base: Duration::ZERO,
            ..Default::default()
        };
        PairFetcher::new(DexScreenerClient::with_transport(
            config,
            FixedTransport { status, body },
        ))
    }

    #[tokio::test]
    async fn test_pairs_found() {
        let fetcher = fetcher(
            StatusCode::OK,
            r#"{"schemaVersion": "1.0.0", "pairs": [{"pairAddress": "0x1"}, {"pairAddress": "0x2"}]}"#,
        );

        match fetcher.get_pairs("ethereum", "0xabc").await {
            PairLookup::Found(pairs) => {
                assert_eq!(pairs.len(), 2);
                assert_eq!(pairs[1].address(), Some("0x2"));
            }
            other => panic!("expected pairs, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_pair_keeps_valid_siblings() {
        let fetcher = fetcher(
            StatusCode::OK,
            r#"{"pairs": [
                {"pairAddress": "0xgood", "baseToken": {"symbol": "WETH"}},
                {"pairAddress": "0xbad", "txns": {"h24": {"buys": "12"}},
                 "pairCreatedAt": 1.7e12, "baseToken": {"symbol": 5}},
                42
            ]}"#,
        );

        match fetcher.get_pairs("ethereum", "0xabc").await {
            PairLookup::Found(pairs) => {
                assert_eq!(pairs.len(), 3);
                assert_eq!(pairs[0].address(), Some("0xgood"));
                assert_eq!(pairs[0].base_symbol(), Some("WETH"));
                assert_eq!(pairs[1].address(), Some("0xbad"));
                assert!(pairs[2].address().is_none());
            }
            other => panic!("expected pairs, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_found_is_soft_error() {
        let fetcher = fetcher(StatusCode::NOT_FOUND, "");
        let (pairs, error) = fetcher.get_pairs("ethereum", "0xabc").await.into_parts();

        assert!(pairs.is_empty());
        assert_eq!(error.as_deref(), Some("Token not found: ethereum/0xabc"));
    }

    #[tokio::test]
    async fn test_empty_pairs() {
        for body in [r#"{"pairs": []}"#, r#"{"pairs": null}"#, "{}"] {
            let fetcher = fetcher(StatusCode::OK, body);
            assert_eq!(
                fetcher.get_pairs("bsc", "0xabc").await,
                PairLookup::Empty("No trading pairs found for bsc/0xabc".into())
            );
        }
    }

    #[tokio::test]
    async fn test_client_error_is_folded() {
        let fetcher = fetcher(StatusCode::BAD_GATEWAY, "bad gateway");
        let lookup = fetcher.get_pairs("solana", "So1").await;

        assert_eq!(
            lookup,
            PairLookup::Failed(
                "Error fetching pairs for solana/So1: \
                 API request failed with status code 502: bad gateway"
                    .into()
            )
        );
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_is_folded() {
        let fetcher = fetcher(StatusCode::TOO_MANY_REQUESTS, "");
        let (pairs, error) = fetcher.get_pairs("solana", "So1").await.into_parts();

        assert!(pairs.is_empty());
        let error = error.unwrap();
        assert!(error.starts_with("Error fetching pairs for solana/So1:"));
        assert!(error.contains("Rate limit exceeded after 4 attempts"));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_folded() {
        let fetcher = fetcher(StatusCode::OK, r#"{"pairs": "nope"}"#);
        assert!(matches!(
            fetcher.get_pairs("solana", "So1").await,
            PairLookup::Failed(_)
        ));
    }
}
