//! Merge of the chain registry with the TVL feed into the published ordering.

mod input;
mod merge;

pub use input::{parse_registry, parse_tvl_feed, Feed, InvalidInputError};
pub use merge::{reconcile, Reconciler};
