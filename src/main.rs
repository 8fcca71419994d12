//! PairSync - DexScreener trading pair indexer
//!
//! Fetches trading pairs for configured tokens and keeps one document per
//! pair in a local store.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use pairsync::adapters::cli::{
    AddConnectorCmd, CliApp, Command, ConnectorAction, IndexCmd, ListConnectorsCmd, PairsCmd,
    RemoveConnectorCmd,
};
use pairsync::adapters::dexscreener::{DexScreenerClient, PairFetcher};
use pairsync::adapters::enrichment::{DisabledSummarizer, HashingEmbedder, MarkdownChunker};
use pairsync::adapters::storage::JsonFileStore;
use pairsync::application::{DocumentSynchronizer, PairIndexer};
use pairsync::config::{load_config, Config};
use pairsync::domain::connector::ConnectorKind;
use pairsync::domain::formatter::format_pair_markdown;
use pairsync::domain::token::ConnectorConfig;
use pairsync::ports::market_data::{PairLookup, PairSource};
use pairsync::ports::storage::{ConnectorStore, DocumentStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (env overrides go here, not in the toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    let config = load_config(config_path(&app.command))
        .with_context(|| format!("Failed to load configuration from {}", config_path(&app.command).display()))?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Index(cmd) => index_command(cmd, &config).await,
        Command::Pairs(cmd) => pairs_command(cmd, &config).await,
        Command::Connector(cmd) => match cmd.action {
            ConnectorAction::Add(cmd) => add_connector_command(cmd, &config).await,
            ConnectorAction::Remove(cmd) => remove_connector_command(cmd, &config).await,
            ConnectorAction::List(cmd) => list_connectors_command(cmd, &config).await,
        },
    }
}

fn config_path(command: &Command) -> &Path {
    match command {
        Command::Index(cmd) => &cmd.config,
        Command::Pairs(cmd) => &cmd.config,
        Command::Connector(cmd) => match &cmd.action {
            ConnectorAction::Add(cmd) => &cmd.config,
            ConnectorAction::Remove(cmd) => &cmd.config,
            ConnectorAction::List(cmd) => &cmd.config,
        },
    }
}

fn init_logging(verbose: bool, debug: bool, level: &str) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

fn open_store(config: &Config) -> Result<JsonFileStore> {
    let path = config.storage.get_path();
    JsonFileStore::open(&path)
        .with_context(|| format!("Failed to open store at {}", path.display()))
}

fn build_fetcher(config: &Config) -> Result<PairFetcher> {
    let client = DexScreenerClient::with_config(config.dexscreener.client_config())
        .context("Failed to create DexScreener client")?;
    tracing::debug!("DexScreener client initialized: {}", client.base_url());
    Ok(PairFetcher::new(client))
}

async fn index_command(cmd: IndexCmd, config: &Config) -> Result<()> {
    let store = Arc::new(open_store(config)?);
    let fetcher = build_fetcher(config)?;

    // Scope comes from the connector itself; an unknown id falls through to
    // the indexer's own not-found failure
    let (search_space_id, user_id) = store
        .get_connector(cmd.connector, ConnectorKind::DexscreenerConnector)
        .await
        .context("Failed to read connector")?
        .map(|c| (c.search_space_id, c.user_id))
        .unwrap_or_default();

    let embedder = Arc::new(HashingEmbedder::default());
    let synchronizer = DocumentSynchronizer::new(
        Arc::new(DisabledSummarizer),
        embedder.clone(),
        Arc::new(MarkdownChunker::new(embedder)),
    );
    let indexer = PairIndexer::new(Arc::new(fetcher), store, synchronizer)
        .with_batch_size(config.indexing.batch_size);

    let update_last_indexed = config.indexing.update_last_indexed && !cmd.no_update_last_indexed;
    let outcome = indexer
        .run(cmd.connector, search_space_id, &user_id, update_last_indexed)
        .await;

    if let Some(error) = outcome.error {
        bail!("Indexing failed: {}", error);
    }

    let stats = outcome.stats;
    println!("Indexed {} documents for connector {}", outcome.documents_indexed, cmd.connector);
    println!("  Created:   {}", stats.documents_created);
    println!("  Updated:   {}", stats.documents_updated);
    println!("  Unchanged: {}", stats.documents_unchanged);
    println!("  Skipped:   {}", stats.documents_skipped);
    println!("  Tokens:    {}", stats.tokens_processed);
    for skipped in &stats.skipped_tokens {
        println!("  Skipped token: {}", skipped);
    }

    Ok(())
}

async fn pairs_command(cmd: PairsCmd, config: &Config) -> Result<()> {
    let token = cmd.token().context("Invalid token")?;
    let fetcher = build_fetcher(config)?;

    match fetcher.get_pairs(&token.chain, &token.address).await {
        PairLookup::Found(pairs) => {
            println!("Found {} pairs for {}/{}\n", pairs.len(), token.chain, token.address);
            for pair in &pairs {
                println!("{}", format_pair_markdown(pair, token.display_name()));
                println!("---\n");
            }
            Ok(())
        }
        PairLookup::Empty(reason) => {
            println!("{}", reason);
            Ok(())
        }
        PairLookup::Failed(reason) => bail!(reason),
    }
}

async fn add_connector_command(cmd: AddConnectorCmd, config: &Config) -> Result<()> {
    let tokens = cmd.token_configs().context("Invalid token specification")?;
    let connector_config = ConnectorConfig::new(tokens);
    connector_config
        .validate()
        .context("Invalid connector configuration")?;

    let store = open_store(config)?;
    let connector = store
        .upsert_connector(
            cmd.space,
            &cmd.user,
            ConnectorKind::DexscreenerConnector,
            connector_config,
        )
        .await
        .context("Failed to save connector")?;
    store.commit().await.context("Failed to save connector")?;

    tracing::info!(connector_id = connector.id, "Connector saved");
    println!(
        "Connector {} saved with {} tokens (search space {}, user {})",
        connector.id,
        connector.config.tokens.len(),
        connector.search_space_id,
        connector.user_id
    );
    Ok(())
}

async fn remove_connector_command(cmd: RemoveConnectorCmd, config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let removed = store
        .delete_connector(cmd.space, &cmd.user, ConnectorKind::DexscreenerConnector)
        .await
        .context("Failed to delete connector")?;

    if !removed {
        bail!(
            "No DexScreener connector for user {} in search space {}",
            cmd.user,
            cmd.space
        );
    }

    store.commit().await.context("Failed to delete connector")?;
    println!("Connector removed");
    Ok(())
}

async fn list_connectors_command(cmd: ListConnectorsCmd, config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let connectors = store
        .list_connectors()
        .await
        .context("Failed to list connectors")?;

    match cmd.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&connectors)?);
        }
        _ => {
            if connectors.is_empty() {
                println!("No connectors");
            }
            for connector in &connectors {
                let last = connector
                    .last_indexed_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "#{} {} (space {}, user {}) - {} tokens, last indexed {}",
                    connector.id,
                    connector.kind,
                    connector.search_space_id,
                    connector.user_id,
                    connector.config.tokens.len(),
                    last
                );
                for token in &connector.config.tokens {
                    println!("    {}:{} {}", token.chain, token.address, token.display_name().unwrap_or(""));
                }
            }
        }
    }
    Ok(())
}
