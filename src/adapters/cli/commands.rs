//! CLI Command Definitions
//!
//! clap derive definitions for all pairsync commands. Handlers live in the
//! binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::connector::ConnectorId;
use crate::domain::token::{TokenConfig, ValidationError};

pub const DEFAULT_CONFIG_PATH: &str = "config/pairsync.toml";

/// PairSync - DexScreener trading pair indexer
#[derive(Parser, Debug)]
#[command(
    name = "pairsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Index DexScreener trading pairs into a searchable document store",
    long_about = "PairSync fetches the trading pairs of configured tokens from the \
                  DexScreener API and keeps one document per pair in sync, skipping \
                  pairs whose content has not changed."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an indexing pass for a connector
    Index(IndexCmd),

    /// Fetch and print the pairs of one token without storing them
    Pairs(PairsCmd),

    /// Manage DexScreener connectors
    Connector(ConnectorCmd),
}

/// Run an indexing pass
#[derive(Parser, Debug)]
pub struct IndexCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Connector to index
    #[arg(long, value_name = "ID")]
    pub connector: ConnectorId,

    /// Do not record the sync time on the connector
    #[arg(long)]
    pub no_update_last_indexed: bool,
}

/// Preview the pairs of a token
#[derive(Parser, Debug)]
pub struct PairsCmd {
    /// Chain identifier (e.g., ethereum, solana, bsc)
    #[arg(value_name = "CHAIN")]
    pub chain: String,

    /// Token contract or mint address
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Display name for the token
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

impl PairsCmd {
    /// Validated token for the preview
    pub fn token(&self) -> Result<TokenConfig, ValidationError> {
        let mut token = TokenConfig::new(self.chain.trim(), self.address.trim());
        if let Some(name) = &self.name {
            token = token.with_name(name.as_str());
        }
        token.validate()?;
        Ok(token)
    }
}

/// Connector management
#[derive(Parser, Debug)]
pub struct ConnectorCmd {
    #[command(subcommand)]
    pub action: ConnectorAction,
}

#[derive(Subcommand, Debug)]
pub enum ConnectorAction {
    /// Create the connector of a user in a search space, or replace its tokens
    Add(AddConnectorCmd),

    /// Delete the connector of a user in a search space
    Remove(RemoveConnectorCmd),

    /// List all connectors
    List(ListConnectorsCmd),
}

#[derive(Parser, Debug)]
pub struct AddConnectorCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Search space the documents belong to
    #[arg(long, value_name = "ID")]
    pub space: i64,

    /// Owning user
    #[arg(long, value_name = "USER")]
    pub user: String,

    /// Token to track as chain:address[:name]; repeat for several tokens
    #[arg(long = "token", value_name = "SPEC", required = true)]
    pub tokens: Vec<String>,
}

impl AddConnectorCmd {
    /// Parse and validate every `--token` spec
    pub fn token_configs(&self) -> Result<Vec<TokenConfig>, ValidationError> {
        self.tokens.iter().map(|s| TokenConfig::parse_spec(s)).collect()
    }
}

#[derive(Parser, Debug)]
pub struct RemoveConnectorCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Search space of the connector
    #[arg(long, value_name = "ID")]
    pub space: i64,

    /// Owning user
    #[arg(long, value_name = "USER")]
    pub user: String,
}

#[derive(Parser, Debug)]
pub struct ListConnectorsCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}
