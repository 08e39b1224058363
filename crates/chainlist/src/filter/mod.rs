//! Display-side filters applied by consumers of a published list.
//!
//! Both are stateless and evaluated per request; nothing here is persisted.

use crate::registry::ChainRecord;

/// Heuristic: "test" anywhere in name, title, or network (case-insensitive).
/// Mainnets whose name happens to contain "test" are hidden as well.
pub fn is_testnet(chain: &ChainRecord) -> bool {
    [
        Some(chain.name.as_str()),
        chain.title.as_deref(),
        chain.network.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains("test"))
}

/// Free-text search over short chain name, chain id, name, and currency symbol.
/// An empty query matches everything. The query is not trimmed: surrounding
/// spaces are part of the substring.
pub fn matches_search(chain: &ChainRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    if chain.chain_id.to_string().contains(&query) {
        return true;
    }
    [
        chain.chain.as_deref(),
        Some(chain.name.as_str()),
        chain.native_currency_symbol(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&query))
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayFilter {
    pub include_testnets: bool,
    pub search: String,
}

impl DisplayFilter {
    /// Chains passing both filters, in their published order.
    pub fn apply<'a>(&self, chains: &'a [ChainRecord]) -> Vec<&'a ChainRecord> {
        chains
            .iter()
            .filter(|c| self.include_testnets || !is_testnet(c))
            .filter(|c| matches_search(c, &self.search))
            .collect()
    }
}
