//! Integration tests using saved registry / TVL fixtures.

use chainlist::filter::DisplayFilter;
use chainlist::publish::{build_snapshot, snapshot_hash, Publisher};
use chainlist::reconcile::{parse_registry, parse_tvl_feed};
use chainlist::{FetchConfig, Fetcher, RawFeeds, Reconciler, StaticTables};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(path: &str) -> serde_json::Value {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../testdata");
    let full = root.join(path);
    let s =
        std::fs::read_to_string(&full).unwrap_or_else(|e| panic!("read {}: {}", full.display(), e));
    serde_json::from_str(&s).unwrap_or_else(|e| panic!("parse {}: {}", path, e))
}

fn embedded_reconciler() -> Reconciler {
    Reconciler::new(StaticTables::embedded().unwrap())
}

fn reconciled_fixtures() -> Vec<chainlist::ChainRecord> {
    let registry = parse_registry(&load_fixture("chains.json")).unwrap();
    let tvl = parse_tvl_feed(&load_fixture("tvl.json")).unwrap();
    embedded_reconciler().reconcile(&registry, &tvl)
}

#[test]
fn integration_fixture_order() {
    let out = reconciled_fixtures();
    let ids: Vec<u64> = out.iter().map(|c| c.chain_id).collect();
    // 420coin dropped; ranked chains first, then unranked in registry order.
    assert_eq!(ids, vec![1, 56, 2020, 5, 424242]);
    assert_eq!(out[2].name, "Ronin Mainnet");
    assert_eq!(out[0].chain_slug.as_deref(), Some("ethereum"));
    assert_eq!(out[1].chain_slug.as_deref(), Some("bsc"));
    assert_eq!(out[1].tvl, Some(5123456789.0));
    assert!(out[3].tvl.is_none() && out[4].tvl.is_none());
}

#[test]
fn integration_rpc_merge() {
    let out = reconciled_fixtures();
    assert_eq!(
        out[0].rpc,
        vec![
            "https://api.mycryptoapi.com/eth",
            "https://cloudflare-eth.com",
            "https://rpc.ankr.com/eth",
            "https://eth-mainnet.public.blastapi.io",
            "https://ethereum.publicnode.com",
        ]
    );
    // Goerli only had templated endpoints.
    assert!(out[3].rpc.is_empty());
    assert_eq!(out[4].rpc, vec!["https://rpc.side.example"]);
    for chain in &out {
        assert!(chain.rpc.iter().all(|r| !r.contains("${") && !r.ends_with('/')));
    }
}

#[test]
fn integration_extra_fields_survive() {
    let out = reconciled_fixtures();
    let json = serde_json::to_value(&out[0]).unwrap();
    assert_eq!(json["shortName"], "eth");
    assert_eq!(json["infoURL"], "https://ethereum.org");
    assert_eq!(json["chainSlug"], "ethereum");
}

#[test]
fn integration_display_filters() {
    let out = reconciled_fixtures();
    let mainnets = DisplayFilter::default().apply(&out);
    assert!(mainnets.iter().all(|c| c.chain_id != 5));
    assert_eq!(mainnets.len(), 4);

    let search = DisplayFilter {
        include_testnets: true,
        search: "bnb".into(),
    };
    let hits = search.apply(&out);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chain_id, 56);
}

#[test]
fn integration_snapshot_hash_deterministic() {
    let raw = RawFeeds {
        registry: load_fixture("chains.json"),
        tvl: load_fixture("tvl.json"),
    };
    let urls = FetchConfig::default().feed_urls();
    let snap = build_snapshot(&urls, &raw, &embedded_reconciler()).unwrap();
    assert_eq!(snap.chain_count, 5);
    assert_eq!(snapshot_hash(&snap).unwrap(), snapshot_hash(&snap.clone()).unwrap());
}

#[tokio::test]
async fn integration_regenerate_from_mock_feeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chains.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("chains.json")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture("tvl.json")))
        .mount(&server)
        .await;
    let config = FetchConfig {
        registry_url: format!("{}/chains.json", server.uri()),
        tvl_url: format!("{}/chains", server.uri()),
        ..Default::default()
    };
    let fetcher = Fetcher::new(config, None).unwrap();
    let publisher = Publisher::new();
    let snap = publisher
        .regenerate(&fetcher, &embedded_reconciler())
        .await
        .unwrap();
    assert_eq!(snap.chains[0].chain_id, 1);
    assert_eq!(fetcher.request_count(), 2);
}
