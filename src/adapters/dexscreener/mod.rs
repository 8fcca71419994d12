//! DexScreener Adapter
//!
//! Implementation of the PairSource port for the public DexScreener API.
//! Handles rate limiting, 429 backoff, transport retries and the mapping of
//! `tokens/{chain}/{address}` responses to pair records.

mod client;
mod error;
mod fetcher;

pub use client::{
    ApiResponse, DexScreenerClient, DexScreenerConfig, HttpResponse, HttpTransport,
    ReqwestTransport,
};
pub use error::ClientError;
pub use fetcher::PairFetcher;
