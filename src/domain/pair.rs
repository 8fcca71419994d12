//! DexScreener Pair Types
//!
//! Raw JSON mapping for `GET /tokens/{chain}/{address}`. Every field is
//! optional; placeholders are resolved in the formatter, not here.
//!
//! A value of the wrong type is read as absent, and a pair entry that is not
//! an object becomes an empty record (no address, so it is skipped later).
//! One bad pair never fails the response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Response body of the token pairs endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairsResponse {
    #[serde(default)]
    pub schema_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_pairs")]
    pub pairs: Vec<PairRecord>,
}

/// A single trading pair as returned by DexScreener
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PairRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub chain_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub dex_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub pair_address: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub base_token: Option<PairToken>,
    #[serde(deserialize_with = "lenient")]
    pub quote_token: Option<PairToken>,
    #[serde(deserialize_with = "lenient_string")]
    pub price_native: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub price_usd: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub txns: Option<Txns>,
    #[serde(deserialize_with = "lenient")]
    pub volume: Option<Windowed>,
    #[serde(deserialize_with = "lenient")]
    pub price_change: Option<Windowed>,
    #[serde(deserialize_with = "lenient")]
    pub liquidity: Option<Liquidity>,
    #[serde(deserialize_with = "lenient_f64")]
    pub fdv: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub pair_created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairToken {
    #[serde(deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
}

/// Values over the 5m / 1h / 6h / 24h windows (volume, price change)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Windowed {
    #[serde(deserialize_with = "lenient_f64")]
    pub m5: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub h1: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub h6: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Txns {
    #[serde(deserialize_with = "lenient")]
    pub m5: Option<TxnCounts>,
    #[serde(deserialize_with = "lenient")]
    pub h1: Option<TxnCounts>,
    #[serde(deserialize_with = "lenient")]
    pub h6: Option<TxnCounts>,
    #[serde(deserialize_with = "lenient")]
    pub h24: Option<TxnCounts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxnCounts {
    #[serde(deserialize_with = "lenient_u64")]
    pub buys: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub sells: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Liquidity {
    #[serde(deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub base: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub quote: Option<f64>,
}

impl PairRecord {
    /// Pair address if present and non-empty
    pub fn address(&self) -> Option<&str> {
        self.pair_address.as_deref().filter(|a| !a.is_empty())
    }

    pub fn base_symbol(&self) -> Option<&str> {
        self.base_token.as_ref().and_then(|t| t.symbol.as_deref())
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base_token.as_ref().and_then(|t| t.name.as_deref())
    }

    pub fn quote_symbol(&self) -> Option<&str> {
        self.quote_token.as_ref().and_then(|t| t.symbol.as_deref())
    }

    pub fn liquidity_usd(&self) -> Option<f64> {
        self.liquidity.as_ref().and_then(|l| l.usd)
    }

    pub fn volume_24h(&self) -> Option<f64> {
        self.volume.as_ref().and_then(|v| v.h24)
    }

    pub fn price_change_24h(&self) -> Option<f64> {
        self.price_change.as_ref().and_then(|p| p.h24)
    }

    pub fn txns_24h(&self) -> Option<&TxnCounts> {
        self.txns.as_ref().and_then(|t| t.h24.as_ref())
    }
}

/// Null or missing list is empty; entries are read one by one
fn lenient_pairs<'de, D>(deserializer: D) -> Result<Vec<PairRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|entry| {
            PairRecord::deserialize(entry).unwrap_or_else(|e| {
                tracing::warn!("Malformed pair entry: {}", e);
                PairRecord::default()
            })
        })
        .collect())
}

/// Any nested value; the wrong shape reads as `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| T::deserialize(v).ok()))
}

fn number(value: Option<Value>) -> Option<f64> {
    let parsed: Option<f64> = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Accepts a number, a numeric string or null; anything unparseable is `None`
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(Option::<Value>::deserialize(deserializer)?))
}

/// Counts; negative or non-numeric values are `None`
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    if let Some(n) = value.as_ref().and_then(Value::as_u64) {
        return Ok(Some(n));
    }
    Ok(number(value).filter(|v| *v >= 0.0).map(|v| v as u64))
}

/// Millisecond timestamps, possibly sent as floats (`1.7e12`)
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    if let Some(n) = value.as_ref().and_then(Value::as_i64) {
        return Ok(Some(n));
    }
    Ok(number(value).map(|v| v as i64))
}

/// Strings; bare numbers are kept as their decimal text
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
