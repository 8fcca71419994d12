//! Tracked Token Configuration
//!
//! The token list a connector indexes. Entries are stored leniently (a
//! missing chain or address deserializes to an empty string) so that a bad
//! entry can be skipped at index time instead of failing the whole connector.
//! Strict validation happens when a connector is created or updated.

use once_regex::{chain_pattern, evm_pattern};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of tokens a single connector may track
pub const MAX_TOKENS_PER_CONNECTOR: usize = 50;

/// Solana addresses are base58 strings of this length range
const SOLANA_ADDRESS_MIN_LEN: usize = 32;
const SOLANA_ADDRESS_MAX_LEN: usize = 44;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid chain '{0}': must match [a-z0-9-]+")]
    InvalidChain(String),

    #[error("Invalid EVM address format. Must be 0x followed by 40 hex characters.")]
    InvalidEvmAddress,

    #[error("Invalid Solana address format. Must be 32-44 characters.")]
    InvalidSolanaLength,

    #[error("Invalid Solana address format. Contains invalid characters.")]
    InvalidSolanaCharacters,

    #[error("At least one token must be configured")]
    NoTokens,

    #[error("Too many tokens: {count} (max {max})")]
    TooManyTokens { count: usize, max: usize },

    #[error("Invalid token spec '{0}': expected chain:address[:name]")]
    InvalidSpec(String),
}

/// A single token to track on a given chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TokenConfig {
    /// Chain identifier as used by DexScreener (e.g. `ethereum`, `solana`)
    #[serde(default)]
    pub chain: String,
    /// Token contract / mint address
    #[serde(default)]
    pub address: String,
    /// Optional display name overriding the base token name
    #[serde(default)]
    pub name: Option<String>,
}

impl TokenConfig {
    pub fn new(chain: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            address: address.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Both chain and address present; anything else never reaches the fetcher
    pub fn is_indexable(&self) -> bool {
        !self.chain.trim().is_empty() && !self.address.trim().is_empty()
    }

    /// Display name if one was configured and non-empty
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// Label used in logs and skip reports
    pub fn label(&self) -> &str {
        self.display_name().unwrap_or(&self.address)
    }

    /// Strict validation applied when a connector is saved
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_chain(&self.chain)?;
        validate_address(&self.address)
    }

    /// Parse a `chain:address[:name]` CLI spec
    pub fn parse_spec(spec: &str) -> Result<Self, ValidationError> {
        let mut parts = spec.splitn(3, ':');
        let chain = parts.next().unwrap_or_default().trim();
        let address = parts.next().unwrap_or_default().trim();
        let name = parts.next().map(str::trim).filter(|n| !n.is_empty());

        if chain.is_empty() || address.is_empty() {
            return Err(ValidationError::InvalidSpec(spec.to_string()));
        }

        let mut token = TokenConfig::new(chain, address);
        if let Some(name) = name {
            token = token.with_name(name);
        }
        token.validate()?;
        Ok(token)
    }
}

/// Persisted per-connector configuration: `{"tokens": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

impl ConnectorConfig {
    pub fn new(tokens: Vec<TokenConfig>) -> Self {
        Self { tokens }
    }

    /// Validate the full token list (1..=50 entries, each strictly valid)
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tokens.is_empty() {
            return Err(ValidationError::NoTokens);
        }
        if self.tokens.len() > MAX_TOKENS_PER_CONNECTOR {
            return Err(ValidationError::TooManyTokens {
                count: self.tokens.len(),
                max: MAX_TOKENS_PER_CONNECTOR,
            });
        }
        self.tokens.iter().try_for_each(TokenConfig::validate)
    }
}

pub fn validate_chain(chain: &str) -> Result<(), ValidationError> {
    if chain_pattern().is_match(chain) {
        Ok(())
    } else {
        Err(ValidationError::InvalidChain(chain.to_string()))
    }
}

/// Accepts EVM (`0x` + 40 hex) or Solana (32-44 base58 chars) addresses
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    if address.starts_with("0x") {
        return if evm_pattern().is_match(address) {
            Ok(())
        } else {
            Err(ValidationError::InvalidEvmAddress)
        };
    }

    if address.len() < SOLANA_ADDRESS_MIN_LEN || address.len() > SOLANA_ADDRESS_MAX_LEN {
        return Err(ValidationError::InvalidSolanaLength);
    }

    bs58::decode(address)
        .into_vec()
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidSolanaCharacters)
}

mod once_regex {
    use regex::Regex;
    use std::sync::OnceLock;

    pub fn chain_pattern() -> &'static Regex {
        static CHAIN: OnceLock<Regex> = OnceLock::new();
        CHAIN.get_or_init(|| Regex::new(r"^[a-z0-9-]+$").expect("static regex"))
    }

    pub fn evm_pattern() -> &'static Regex {
        static EVM: OnceLock<Regex> = OnceLock::new();
        EVM.get_or_init(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("static regex"))
    }
}
