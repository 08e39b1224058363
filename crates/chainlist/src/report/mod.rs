//! Report data structure (HTML is generated in the chainlist_report crate).

use crate::filter::DisplayFilter;
use crate::publish::Snapshot;
use crate::registry::ChainRecord;
use serde::{Deserialize, Serialize};

/// What the HTML listing renders: the filtered chains of one snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportData {
    pub created_utc_rfc3339: String,
    pub snapshot_hash_sha256: String,
    pub total_chains: usize,
    pub include_testnets: bool,
    pub search: String,
    pub chains: Vec<ChainRecord>,
}

impl ReportData {
    pub fn from_snapshot(snapshot: &Snapshot, hash: String, filter: &DisplayFilter) -> Self {
        Self {
            created_utc_rfc3339: snapshot.created_utc_rfc3339.clone(),
            snapshot_hash_sha256: hash,
            total_chains: snapshot.chain_count,
            include_testnets: filter.include_testnets,
            search: filter.search.clone(),
            chains: filter.apply(&snapshot.chains).into_iter().cloned().collect(),
        }
    }
}
