//! One published generation of the chain list, plus its SHA-256 content hash.

use crate::chain::FeedUrls;
use crate::registry::ChainRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SNAPSHOT_FILE: &str = "chains.json";
const HASH_FILE: &str = "chains.sha256";
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Reconciled chains from one cycle. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub created_utc_rfc3339: String,
    pub registry_url: String,
    pub tvl_url: String,
    pub chain_count: usize,
    /// Sorted by TVL descending.
    pub chains: Vec<ChainRecord>,
}

impl Snapshot {
    pub fn new(urls: &FeedUrls, chains: Vec<ChainRecord>) -> Self {
        let created_utc_rfc3339 = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self {
            version: SNAPSHOT_VERSION,
            created_utc_rfc3339,
            registry_url: urls.registry.clone(),
            tvl_url: urls.tvl.clone(),
            chain_count: chains.len(),
            chains,
        }
    }
}

/// Normalize JSON for hashing: sorted keys, no whitespace.
pub fn normalize_for_hash(value: &serde_json::Value) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&sort_json_keys(value))?)
}

fn sort_json_keys(v: &serde_json::Value) -> serde_json::Value {
    match v {
        serde_json::Value::Object(m) => {
            let sorted: BTreeMap<&String, serde_json::Value> =
                m.iter().map(|(k, v)| (k, sort_json_keys(v))).collect();
            serde_json::Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), v))
                    .collect(),
            )
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(sort_json_keys).collect())
        }
        other => other.clone(),
    }
}

/// SHA-256 over the normalized snapshot JSON.
pub fn snapshot_hash(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    let json = serde_json::to_value(snapshot)?;
    let normalized = normalize_for_hash(&json)?;
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationResult {
    pub snapshot_hash: String,
    pub expected_hash: Option<String>,
    pub matches: bool,
}

/// Compare a snapshot against the hex digest from its `.sha256` file.
pub fn verify_snapshot_hash(
    snapshot: &Snapshot,
    expected_hex: Option<&str>,
) -> Result<VerificationResult, SnapshotError> {
    let snapshot_hash = snapshot_hash(snapshot)?;
    let expected = expected_hex.map(|e| e.trim().to_lowercase());
    let matches = expected.as_deref() == Some(snapshot_hash.as_str());
    Ok(VerificationResult {
        snapshot_hash,
        expected_hash: expected,
        matches,
    })
}

/// Paths written by [`write_snapshot`].
#[derive(Clone, Debug)]
pub struct SnapshotFiles {
    pub json: PathBuf,
    pub sha256: PathBuf,
    pub hash: String,
}

/// Write `chains.json` and `chains.sha256` into `dir`. Each file is written to
/// a temp name and renamed, so a reader never sees a partial file. The two
/// renames are not one step: between them a reader sees the new body with the
/// old hash and `verify` reports a mismatch until the hash rename lands.
/// `watch` only reads the pair at startup, before its own first write.
pub fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> Result<SnapshotFiles, SnapshotError> {
    std::fs::create_dir_all(dir)?;
    let hash = snapshot_hash(snapshot)?;
    let json = dir.join(SNAPSHOT_FILE);
    let sha256 = dir.join(HASH_FILE);
    write_atomic(&json, serde_json::to_string_pretty(snapshot)?.as_bytes())?;
    write_atomic(&sha256, format!("{}\n", hash).as_bytes())?;
    Ok(SnapshotFiles { json, sha256, hash })
}

/// Read a snapshot file and the sibling `.sha256` digest if present.
pub fn read_snapshot(path: &Path) -> Result<(Snapshot, Option<String>), SnapshotError> {
    let snapshot: Snapshot = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let sha256_path = path.with_extension("sha256");
    let expected = std::fs::read_to_string(sha256_path)
        .ok()
        .map(|s| s.trim().to_string());
    Ok((snapshot, expected))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> FeedUrls {
        FeedUrls {
            registry: "https://chainid.network/chains.json".into(),
            tvl: "https://api.llama.fi/chains".into(),
        }
    }

    #[test]
    fn normalize_deterministic() {
        let a = serde_json::json!({"z":1,"a":{"y":2,"b":3}});
        let b = serde_json::json!({"a":{"b":3,"y":2},"z":1});
        assert_eq!(normalize_for_hash(&a).unwrap(), normalize_for_hash(&b).unwrap());
    }

    #[test]
    fn hash_deterministic() {
        let snap = Snapshot::new(&urls(), vec![ChainRecord::new(1, "Ethereum Mainnet")]);
        let h1 = snapshot_hash(&snap).unwrap();
        let h2 = snapshot_hash(&snap).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_eq!(snap.chain_count, 1);
    }

    #[test]
    fn write_read_verify() {
        let dir = tempfile::tempdir().unwrap();
        let snap = Snapshot::new(&urls(), vec![ChainRecord::new(10, "Optimism")]);
        let files = write_snapshot(dir.path(), &snap).unwrap();
        let (back, expected) = read_snapshot(&files.json).unwrap();
        assert_eq!(back, snap);
        let result = verify_snapshot_hash(&back, expected.as_deref()).unwrap();
        assert!(result.matches);
        assert_eq!(result.snapshot_hash, files.hash);
        assert!(!dir.path().join("chains.json.tmp").exists());
    }

    #[test]
    fn rewrite_replaces_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = Snapshot::new(&urls(), vec![ChainRecord::new(10, "Optimism")]);
        write_snapshot(dir.path(), &first).unwrap();
        let mut second = first.clone();
        second.chains.push(ChainRecord::new(1, "Ethereum Mainnet"));
        second.chain_count = 2;
        let files = write_snapshot(dir.path(), &second).unwrap();

        let (back, expected) = read_snapshot(&files.json).unwrap();
        assert_eq!(back, second);
        assert_eq!(expected.as_deref(), Some(files.hash.as_str()));
        assert!(verify_snapshot_hash(&back, expected.as_deref()).unwrap().matches);
        assert!(!dir.path().join("chains.sha256.tmp").exists());
    }

    #[test]
    fn tampered_snapshot_mismatch() {
        let snap = Snapshot::new(&urls(), vec![ChainRecord::new(10, "Optimism")]);
        let hash = snapshot_hash(&snap).unwrap();
        let mut tampered = snap.clone();
        tampered.chains[0].tvl = Some(1.0);
        assert!(!verify_snapshot_hash(&tampered, Some(hash.as_str())).unwrap().matches);
        assert!(!verify_snapshot_hash(&snap, None).unwrap().matches);
    }
}
