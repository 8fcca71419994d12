//! Search Source Connectors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::ConnectorConfig;

pub type ConnectorId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectorKind {
    DexscreenerConnector,
}

impl ConnectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::DexscreenerConnector => "DEXSCREENER_CONNECTOR",
        }
    }
}

impl std::fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured source owned by a user within a search space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: ConnectorId,
    pub name: String,
    pub kind: ConnectorKind,
    pub search_space_id: i64,
    pub user_id: String,
    pub config: ConnectorConfig,
    pub is_indexable: bool,
    pub last_indexed_at: Option<DateTime<Utc>>,
}

impl Connector {
    pub fn new_dexscreener(
        id: ConnectorId,
        search_space_id: i64,
        user_id: impl Into<String>,
        config: ConnectorConfig,
    ) -> Self {
        Self {
            id,
            name: "DexScreener Connector".to_string(),
            kind: ConnectorKind::DexscreenerConnector,
            search_space_id,
            user_id: user_id.into(),
            config,
            is_indexable: true,
            last_indexed_at: None,
        }
    }
}
