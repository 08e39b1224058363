//! Static lookup tables injected into the reconciler.
//!
//! Each table is read once at startup. Load order per table: the env var
//! path, then `./config/<file>.json`, then the copy embedded in the crate.
//! A file that exists but cannot be read or parsed is an error, not a
//! silent fallback.

use crate::registry::ChainRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const EMBEDDED_EXTRA_RPCS: &str = include_str!("../../data/extra_rpcs.json");
const EMBEDDED_CHAIN_IDS: &str = include_str!("../../data/chain_ids.json");

pub const EXTRA_RPCS_ENV: &str = "CHAINLIST_EXTRA_RPCS_PATH";
pub const CHAIN_IDS_ENV: &str = "CHAINLIST_CHAIN_IDS_PATH";
pub const EXCLUSIONS_ENV: &str = "CHAINLIST_EXCLUSIONS_PATH";

#[derive(Error, Debug)]
pub enum TablesError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplementalRpcs {
    #[serde(default)]
    pub rpcs: Vec<String>,
}

/// Extra RPC endpoints keyed by chain `name`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplementalRpcTable(HashMap<String, SupplementalRpcs>);

impl SupplementalRpcTable {
    pub fn rpcs_for(&self, chain_name: &str) -> &[String] {
        self.0
            .get(chain_name)
            .map(|e| e.rpcs.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Vec<String>)> for SupplementalRpcTable {
    fn from_iter<T: IntoIterator<Item = (N, Vec<String>)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, rpcs)| (name.into(), SupplementalRpcs { rpcs }))
                .collect(),
        )
    }
}

/// Chain id to the slug used by the TVL feed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainIdToSlugTable(HashMap<u64, String>);

impl ChainIdToSlugTable {
    pub fn slug_for(&self, chain_id: u64) -> Option<&str> {
        self.0.get(&chain_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(u64, S)> for ChainIdToSlugTable {
    fn from_iter<T: IntoIterator<Item = (u64, S)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(id, s)| (id, s.into())).collect())
    }
}

/// Drop registry entries whose `name` equals `name`. Used for known chain-id
/// collisions between distinct networks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionRules(Vec<ExclusionRule>);

impl Default for ExclusionRules {
    fn default() -> Self {
        Self(vec![ExclusionRule {
            name: "420coin".to_string(),
            reason: Some("same chainId as Ronin".to_string()),
        }])
    }
}

impl ExclusionRules {
    pub fn new(rules: Vec<ExclusionRule>) -> Self {
        Self(rules)
    }

    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// The first rule that drops `record`, if any.
    pub fn matching(&self, record: &ChainRecord) -> Option<&ExclusionRule> {
        self.0.iter().find(|r| r.name == record.name)
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.0
    }
}

/// Everything the reconciler needs besides the two feeds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticTables {
    pub supplemental_rpcs: SupplementalRpcTable,
    pub id_to_slug: ChainIdToSlugTable,
    pub exclusions: ExclusionRules,
}

impl StaticTables {
    /// Tables embedded in the crate plus the default exclusion rules.
    pub fn embedded() -> Result<Self, TablesError> {
        Ok(Self {
            supplemental_rpcs: parse_json(EMBEDDED_EXTRA_RPCS, "embedded extra_rpcs.json")?,
            id_to_slug: parse_json(EMBEDDED_CHAIN_IDS, "embedded chain_ids.json")?,
            exclusions: ExclusionRules::default(),
        })
    }

    /// Resolve each table from env, `./config/`, or the embedded copy.
    pub fn load() -> Result<Self, TablesError> {
        let tables = Self {
            supplemental_rpcs: load_table(
                EXTRA_RPCS_ENV,
                "./config/extra_rpcs.json",
                || parse_json(EMBEDDED_EXTRA_RPCS, "embedded extra_rpcs.json"),
            )?,
            id_to_slug: load_table(CHAIN_IDS_ENV, "./config/chain_ids.json", || {
                parse_json(EMBEDDED_CHAIN_IDS, "embedded chain_ids.json")
            })?,
            exclusions: load_table(EXCLUSIONS_ENV, "./config/exclusions.json", || {
                Ok(ExclusionRules::default())
            })?,
        };
        info!(
            supplemental = tables.supplemental_rpcs.len(),
            slugs = tables.id_to_slug.len(),
            exclusions = tables.exclusions.rules().len(),
            "static tables loaded"
        );
        Ok(tables)
    }
}

fn load_table<T, F>(env_var: &str, default_path: &str, fallback: F) -> Result<T, TablesError>
where
    T: for<'de> Deserialize<'de>,
    F: FnOnce() -> Result<T, TablesError>,
{
    if let Ok(path) = std::env::var(env_var) {
        return load_from_path(Path::new(&path));
    }
    let p = Path::new(default_path);
    if p.exists() {
        return load_from_path(p);
    }
    fallback()
}

/// Read one table from a JSON file.
pub fn load_from_path<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, TablesError> {
    let content = std::fs::read_to_string(path).map_err(|source| TablesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&content, &path.display().to_string())
}

fn parse_json<T: for<'de> Deserialize<'de>>(s: &str, origin: &str) -> Result<T, TablesError> {
    serde_json::from_str(s).map_err(|source| TablesError::Json {
        origin: origin.to_string(),
        source,
    })
}
