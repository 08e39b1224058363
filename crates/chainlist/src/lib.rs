//! chainlist — EVM chain list regeneration pipeline.
//!
//! Fetches the chain registry and the TVL ranking feed, reconciles them into
//! one list sorted by TVL, and publishes it as an immutable snapshot.
//! Read-only; nothing is ever written upstream.

pub mod chain;
pub mod filter;
pub mod publish;
pub mod reconcile;
pub mod registry;
pub mod report;

pub use chain::{Cache, FeedUrls, FetchConfig, Fetcher, RawFeeds};
pub use filter::{is_testnet, matches_search, DisplayFilter};
pub use publish::{Publisher, RegenerateError, Snapshot};
pub use reconcile::{reconcile, InvalidInputError, Reconciler};
pub use registry::{
    ChainIdToSlugTable, ChainRecord, ExclusionRule, ExclusionRules, NativeCurrency,
    StaticTables, SupplementalRpcTable, TvlRecord,
};
pub use report::ReportData;
