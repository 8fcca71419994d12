//! CLI Adapter
//!
//! Command-line interface for pairsync.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{
    AddConnectorCmd, CliApp, Command, ConnectorAction, ConnectorCmd, IndexCmd, ListConnectorsCmd,
    PairsCmd, RemoveConnectorCmd, DEFAULT_CONFIG_PATH,
};
