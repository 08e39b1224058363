//! Chain registry records, TVL records, and the static tables used to join them.

mod tables;
mod types;

pub use tables::{
    ChainIdToSlugTable, ExclusionRule, ExclusionRules, StaticTables, SupplementalRpcTable,
    SupplementalRpcs, TablesError,
};
pub use types::{ChainRecord, NativeCurrency, TvlRecord};
