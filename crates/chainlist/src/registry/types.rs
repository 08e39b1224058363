//! Records read from the two feeds.

use serde::{Deserialize, Serialize};

/// Native currency block of a registry entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeCurrency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

/// One network from the chain registry. `tvl` and `chain_slug` are only set by
/// reconciliation. Registry fields without a typed slot are kept in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    pub chain_id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rpc: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_currency: Option<NativeCurrency>,
    /// Short chain name, e.g. `ETH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_slug: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChainRecord {
    /// Minimal record with no optional fields set.
    pub fn new(chain_id: u64, name: impl Into<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
            rpc: Vec::new(),
            native_currency: None,
            chain: None,
            title: None,
            network: None,
            tvl: None,
            chain_slug: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn native_currency_symbol(&self) -> Option<&str> {
        self.native_currency
            .as_ref()
            .and_then(|c| c.symbol.as_deref())
    }

    /// TVL used for ordering; absent counts as zero.
    pub fn tvl_or_zero(&self) -> f64 {
        self.tvl.unwrap_or(0.0)
    }
}

/// One entry of the TVL ranking feed. `name` is matched case-insensitively
/// against a chain slug.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TvlRecord {
    pub name: String,
    #[serde(default)]
    pub tvl: Option<f64>,
}

impl TvlRecord {
    pub fn new(name: impl Into<String>, tvl: f64) -> Self {
        Self {
            name: name.into(),
            tvl: Some(tvl),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(v.unwrap_or_default())
}
