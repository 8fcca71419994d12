//! DexScreener API Client
//!
//! Rate-limited GET client for the public DexScreener API. Knows nothing
//! about pairs; it returns raw JSON or the distinguished "not found" result.
//!
//! - 2xx: parsed body, followed by a fixed courtesy delay
//! - 404: [`ApiResponse::NotFound`], not an error
//! - 429: exponential backoff `base * 2^attempt` (1s, 2s, 4s, ...)
//! - timeout / transport error: immediate retry
//! - anything else: terminal [`ClientError::ApiError`]
//!
//! The retry budget counts retries after the first attempt, so
//! `max_retries = 3` allows four requests in total.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::error::ClientError;

/// DexScreener client configuration
#[derive(Debug, Clone)]
pub struct DexScreenerConfig {
    /// Base URL, endpoints are appended after a `/`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay after every successful request (300 req/min ~ 200ms)
    pub rate_limit_delay: Duration,
    /// First backoff step on HTTP 429
    pub backoff_base: Duration,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dexscreener.com/latest/dex".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            rate_limit_delay: Duration::from_millis(200),
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl DexScreenerConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Backoff before retry number `attempt + 1` after a 429
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Seam between retry policy and the wire
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError>;
}

/// Production transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pairsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Successful outcome of a fetch
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Found(Value),
    NotFound,
}

/// Rate-limited DexScreener client.
///
/// Holds no mutable state, so one instance can be shared across a whole run.
#[derive(Debug, Clone)]
pub struct DexScreenerClient<T = ReqwestTransport> {
    config: DexScreenerConfig,
    transport: T,
}

impl DexScreenerClient<ReqwestTransport> {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, ClientError> {
        Self::with_config(DexScreenerConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: DexScreenerConfig) -> Result<Self, ClientError> {
        if config.base_url.is_empty() {
            return Err(ClientError::ConfigError("base_url cannot be empty".into()));
        }
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self { config, transport })
    }
}

impl<T: HttpTransport> DexScreenerClient<T> {
    /// Create a client over an arbitrary transport
    pub fn with_transport(config: DexScreenerConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &DexScreenerConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// GET `endpoint` with retry, backoff and courtesy delay
    pub async fn fetch(&self, endpoint: &str) -> Result<ApiResponse, ClientError> {
        let url = self.url_for(endpoint);
        let max_retries = self.config.max_retries;
        let mut attempt: u32 = 0;

        loop {
            match self.transport.get(&url).await {
                Ok(response) if response.status.is_success() => {
                    let body: Value = serde_json::from_str(&response.body)?;
                    tokio::time::sleep(self.config.rate_limit_delay).await;
                    return Ok(ApiResponse::Found(body));
                }
                Ok(response) if response.status == StatusCode::NOT_FOUND => {
                    tracing::info!("Resource not found (404): {}", endpoint);
                    return Ok(ApiResponse::NotFound);
                }
                Ok(response) if response.status == StatusCode::TOO_MANY_REQUESTS => {
                    if attempt >= max_retries {
                        tracing::warn!(
                            "Rate limit exceeded on {} after {} attempts, giving up",
                            endpoint,
                            attempt + 1
                        );
                        return Err(ClientError::RateLimited {
                            attempts: attempt + 1,
                        });
                    }
                    let backoff = self.config.backoff_delay(attempt);
                    tracing::warn!(
                        "Rate limited (429), backing off for {:?} (attempt {}/{})",
                        backoff,
                        attempt + 1,
                        max_retries + 1
                    );
                    tokio::time::sleep(backoff).await;
                }
                Ok(response) => {
                    return Err(ClientError::ApiError {
                        status: response.status.as_u16(),
                        body: response.body,
                    });
                }
                Err(e) if e.is_retryable() => {
                    if attempt >= max_retries {
                        return Err(ClientError::MaxRetriesExceeded {
                            attempts: attempt + 1,
                            last_error: e.to_string(),
                        });
                    }
                    tracing::warn!(
                        "{}. Retrying... (attempt {}/{})",
                        e,
                        attempt + 1,
                        max_retries + 1
                    );
                }
                Err(e) => return Err(e),
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Transport that replays a fixed script and records call times
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        script: Arc<Mutex<VecDeque<Result<HttpResponse, ClientError>>>>,
        calls: Arc<Mutex<Vec<(String, Instant)>>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<HttpResponse, ClientError>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
                calls: Arc::default(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1].1 - w[0].1).collect()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
            self.calls.lock().unwrap().push((url.to_string(), Instant::now()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::NetworkError("script exhausted".into())))
        }
    }

    /// Paused-clock timers resolve at millisecond granularity
    fn assert_duration(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(2),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    fn ok(body: &str) -> Result<HttpResponse, ClientError> {
        Ok(HttpResponse::new(StatusCode::OK, body))
    }

    fn status(code: StatusCode) -> Result<HttpResponse, ClientError> {
        Ok(HttpResponse::new(code, ""))
    }

    fn client(transport: ScriptedTransport) -> DexScreenerClient<ScriptedTransport> {
        DexScreenerClient::with_transport(DexScreenerConfig::default(), transport)
    }

    #[test]
    fn test_config_default() {
        let config = DexScreenerConfig::default();
        assert_eq!(config.base_url, "https://api.dexscreener.com/latest/dex");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.rate_limit_delay, Duration::from_millis(200));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_sequence() {
        let config = DexScreenerConfig::default();
        let delays: Vec<_> = (0..4).map(|a| config.backoff_delay(a)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[test]
    fn test_client_creation() {
        assert!(DexScreenerClient::new().is_ok());
        assert!(matches!(
            DexScreenerClient::with_config(DexScreenerConfig::with_base_url("")),
            Err(ClientError::ConfigError(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_applies_courtesy_delay() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"pairs": []}"#)]);
        let client = client(transport.clone());

        let start = Instant::now();
        let response = client.fetch("/tokens/ethereum/0xabc").await.unwrap();

        assert_eq!(response, ApiResponse::Found(serde_json::json!({"pairs": []})));
        assert_duration(start.elapsed(), Duration::from_millis(200));
        assert_eq!(
            transport.calls.lock().unwrap()[0].0,
            "https://api.dexscreener.com/latest/dex/tokens/ethereum/0xabc"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_backoff_then_success() {
        let transport = ScriptedTransport::new(vec![
            status(StatusCode::TOO_MANY_REQUESTS),
            status(StatusCode::TOO_MANY_REQUESTS),
            status(StatusCode::TOO_MANY_REQUESTS),
            ok(r#"{"pairs": [{"pairAddress": "0xpair"}]}"#),
        ]);
        let client = client(transport.clone());

        let response = client.fetch("tokens/solana/So1").await.unwrap();

        assert!(matches!(response, ApiResponse::Found(_)));
        assert_eq!(transport.call_count(), 4);
        let gaps = transport.gaps();
        assert_eq!(gaps.len(), 3);
        assert_duration(gaps[0], Duration::from_secs(1));
        assert_duration(gaps[1], Duration::from_secs(2));
        assert_duration(gaps[2], Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_budget_exhausted() {
        let transport = ScriptedTransport::new(vec![
            status(StatusCode::TOO_MANY_REQUESTS),
            status(StatusCode::TOO_MANY_REQUESTS),
            status(StatusCode::TOO_MANY_REQUESTS),
            status(StatusCode::TOO_MANY_REQUESTS),
            ok("{}"),
        ]);
        let client = client(transport.clone());

        let start = Instant::now();
        let result = client.fetch("tokens/solana/So1").await;

        assert_eq!(result, Err(ClientError::RateLimited { attempts: 4 }));
        assert_eq!(transport.call_count(), 4);
        // 1 + 2 + 4, no fourth sleep
        assert_duration(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_an_error() {
        let transport = ScriptedTransport::new(vec![status(StatusCode::NOT_FOUND)]);
        let client = client(transport.clone());

        let start = Instant::now();
        assert_eq!(client.fetch("tokens/x/y").await, Ok(ApiResponse::NotFound));
        assert_eq!(transport.call_count(), 1);
        assert_duration(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_status_is_terminal() {
        let transport = ScriptedTransport::new(vec![
            Ok(HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom")),
            ok("{}"),
        ]);
        let client = client(transport.clone());

        let result = client.fetch("tokens/x/y").await;
        assert_eq!(
            result,
            Err(ClientError::ApiError {
                status: 500,
                body: "boom".into()
            })
        );
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_retried_then_success() {
        let transport = ScriptedTransport::new(vec![
            Err(ClientError::Timeout),
            Err(ClientError::NetworkError("connection reset".into())),
            ok(r#"{"pairs": null}"#),
        ]);
        let client = client(transport.clone());

        let response = client.fetch("tokens/x/y").await.unwrap();
        assert!(matches!(response, ApiResponse::Found(_)));
        assert_eq!(transport.call_count(), 3);
        for gap in transport.gaps() {
            assert_duration(gap, Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_exhaust_budget() {
        let transport = ScriptedTransport::new(vec![
            Err(ClientError::Timeout),
            Err(ClientError::Timeout),
            Err(ClientError::Timeout),
            Err(ClientError::Timeout),
        ]);
        let client = client(transport.clone());

        let result = client.fetch("tokens/x/y").await;
        assert_eq!(
            result,
            Err(ClientError::MaxRetriesExceeded {
                attempts: 4,
                last_error: "Request timed out".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_json_is_parse_error() {
        let transport = ScriptedTransport::new(vec![ok("<html>")]);
        let client = client(transport);

        assert!(matches!(
            client.fetch("tokens/x/y").await,
            Err(ClientError::ParseError(_))
        ));
    }
}
