//! The reconciliation pass: exclusions, RPC normalization, TVL join, ordering.

use crate::chain::{normalize_rpcs, slug_key};
use crate::registry::{
    ChainIdToSlugTable, ChainRecord, ExclusionRules, StaticTables, SupplementalRpcTable,
    TvlRecord,
};
use std::collections::HashMap;
use tracing::{debug, info};

/// Reconciler bound to one set of static tables.
#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    tables: StaticTables,
}

impl Reconciler {
    pub fn new(tables: StaticTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &StaticTables {
        &self.tables
    }

    pub fn reconcile(&self, registry: &[ChainRecord], tvl_feed: &[TvlRecord]) -> Vec<ChainRecord> {
        reconcile_with(
            registry,
            tvl_feed,
            &self.tables.supplemental_rpcs,
            &self.tables.id_to_slug,
            &self.tables.exclusions,
        )
    }
}

/// Reconcile with the default exclusion rules.
pub fn reconcile(
    registry: &[ChainRecord],
    tvl_feed: &[TvlRecord],
    supplemental_rpcs: &SupplementalRpcTable,
    id_to_slug: &ChainIdToSlugTable,
) -> Vec<ChainRecord> {
    reconcile_with(
        registry,
        tvl_feed,
        supplemental_rpcs,
        id_to_slug,
        &ExclusionRules::default(),
    )
}

fn reconcile_with(
    registry: &[ChainRecord],
    tvl_feed: &[TvlRecord],
    supplemental_rpcs: &SupplementalRpcTable,
    id_to_slug: &ChainIdToSlugTable,
    exclusions: &ExclusionRules,
) -> Vec<ChainRecord> {
    // First entry wins when the feed repeats a name.
    let mut tvl_by_name: HashMap<String, &TvlRecord> = HashMap::with_capacity(tvl_feed.len());
    for rec in tvl_feed {
        tvl_by_name.entry(slug_key(&rec.name)).or_insert(rec);
    }

    let mut out: Vec<ChainRecord> = registry
        .iter()
        .filter(|chain| match exclusions.matching(chain) {
            Some(rule) => {
                debug!(chain_id = chain.chain_id, name = %chain.name, reason = ?rule.reason, "excluded");
                false
            }
            None => true,
        })
        .map(|chain| {
            let mut chain = chain.clone();
            chain.rpc = normalize_rpcs(&chain.rpc, supplemental_rpcs.rpcs_for(&chain.name));
            if let Some(slug) = id_to_slug.slug_for(chain.chain_id) {
                if let Some(defi) = tvl_by_name.get(&slug_key(slug)) {
                    chain.tvl = defi.tvl;
                    chain.chain_slug = Some(slug.to_string());
                }
            }
            chain
        })
        .collect();

    // Stable: ties keep registry order.
    out.sort_by(|a, b| b.tvl_or_zero().total_cmp(&a.tvl_or_zero()));

    info!(
        registry = registry.len(),
        tvl_feed = tvl_feed.len(),
        output = out.len(),
        with_tvl = out.iter().filter(|c| c.tvl.is_some()).count(),
        "reconciled"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(id: u64, name: &str, rpc: &[&str]) -> ChainRecord {
        let mut c = ChainRecord::new(id, name);
        c.rpc = rpc.iter().map(|s| s.to_string()).collect();
        c
    }

    fn with_tvl(id: u64, tvl: Option<f64>) -> ChainRecord {
        let mut c = ChainRecord::new(id, format!("chain-{id}"));
        c.tvl = tvl;
        c
    }

    #[test]
    fn tvl_join_case_insensitive() {
        let registry = vec![chain(1, "Ethereum Mainnet", &[])];
        let feed = vec![TvlRecord::new("Ethereum", 1000.0)];
        let ids: ChainIdToSlugTable = [(1, "ethereum")].into_iter().collect();
        let out = reconcile(&registry, &feed, &SupplementalRpcTable::default(), &ids);
        assert_eq!(out[0].tvl, Some(1000.0));
        assert_eq!(out[0].chain_slug.as_deref(), Some("ethereum"));
    }

    #[test]
    fn exclusion_drops_named_chain_only() {
        let registry = vec![chain(2020, "420coin", &[]), chain(2020, "Ronin Mainnet", &[])];
        let out = reconcile(
            &registry,
            &[],
            &SupplementalRpcTable::default(),
            &ChainIdToSlugTable::default(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Ronin Mainnet");
        assert!(out.iter().all(|c| c.name != "420coin"));
    }

    #[test]
    fn distinct_chain_ids_never_merged() {
        let registry = vec![chain(1, "Same", &[]), chain(2, "Same", &[])];
        let out = reconcile(
            &registry,
            &[],
            &SupplementalRpcTable::default(),
            &ChainIdToSlugTable::default(),
        );
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn sort_is_stable_descending() {
        // Records already carry tvl; no slug table so nothing is overwritten.
        let registry = vec![
            with_tvl(1, Some(5.0)),
            with_tvl(2, None),
            with_tvl(3, Some(10.0)),
            with_tvl(4, None),
        ];
        let out = reconcile(
            &registry,
            &[],
            &SupplementalRpcTable::default(),
            &ChainIdToSlugTable::default(),
        );
        let ids: Vec<u64> = out.iter().map(|c| c.chain_id).collect();
        assert_eq!(ids, vec![3, 1, 2, 4]);
    }

    #[test]
    fn unmapped_chain_passes_through() {
        let mut input = chain(999, "Lonely", &["https://lonely.io/"]);
        input.title = Some("Lonely chain".into());
        let registry = vec![input.clone(), chain(1, "Ethereum Mainnet", &[])];
        let feed = vec![TvlRecord::new("ethereum", 1.0)];
        let ids: ChainIdToSlugTable = [(1, "ethereum")].into_iter().collect();
        let out = reconcile(&registry, &feed, &SupplementalRpcTable::default(), &ids);
        assert_eq!(out[0].chain_id, 1);
        let lonely = &out[1];
        assert_eq!(lonely.tvl, None);
        assert_eq!(lonely.chain_slug, None);
        assert_eq!(lonely.rpc, vec!["https://lonely.io".to_string()]);
        let mut expected = input;
        expected.rpc = lonely.rpc.clone();
        assert_eq!(lonely, &expected);
    }

    #[test]
    fn slug_without_feed_entry_leaves_tvl_absent() {
        let registry = vec![chain(56, "BSC", &[])];
        let ids: ChainIdToSlugTable = [(56, "bsc")].into_iter().collect();
        let out = reconcile(&registry, &[TvlRecord::new("Polygon", 3.0)], &SupplementalRpcTable::default(), &ids);
        assert_eq!(out[0].tvl, None);
        assert_eq!(out[0].chain_slug, None);
    }

    #[test]
    fn supplemental_rpcs_merged_after_own() {
        let registry = vec![chain(
            1,
            "Ethereum Mainnet",
            &["https://mainnet.infura.io/v3/${INFURA_API_KEY}", "https://cloudflare-eth.com/"],
        )];
        let extra: SupplementalRpcTable = [(
            "Ethereum Mainnet",
            vec!["https://cloudflare-eth.com".to_string(), "https://rpc.ankr.com/eth/".to_string()],
        )]
        .into_iter()
        .collect();
        let out = reconcile(&registry, &[], &extra, &ChainIdToSlugTable::default());
        assert_eq!(
            out[0].rpc,
            vec!["https://cloudflare-eth.com".to_string(), "https://rpc.ankr.com/eth".to_string()]
        );
    }

    #[test]
    fn reconciler_uses_injected_exclusions() {
        let tables = StaticTables {
            exclusions: ExclusionRules::none(),
            ..Default::default()
        };
        let registry = vec![chain(2020, "420coin", &[])];
        assert_eq!(Reconciler::new(tables).reconcile(&registry, &[]).len(), 1);
    }
}
