//! DexScreener Client Errors

use thiserror::Error;

/// Errors that can occur when talking to the DexScreener API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// HTTP client error (body read, redirect, builder)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Non-success status other than 404/429
    #[error("API request failed with status code {status}: {body}")]
    ApiError { status: u16, body: String },

    /// Still rate limited after the retry budget
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Request timeout
    #[error("Request timed out")]
    Timeout,

    /// Network/connection error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body was not valid JSON
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Transport failures exhausted the retry budget
    #[error("Request failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    /// Client could not be constructed
    #[error("Client configuration error: {0}")]
    ConfigError(String),
}

impl ClientError {
    /// Transport-level failures are retried; status and parse errors are not
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::HttpError(_) | ClientError::Timeout | ClientError::NetworkError(_)
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() || err.is_request() {
            ClientError::NetworkError(err.to_string())
        } else if err.is_builder() {
            ClientError::ConfigError(err.to_string())
        } else {
            ClientError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::ParseError(err.to_string())
    }
}
