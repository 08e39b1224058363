//! Feed fetching, response caching, and endpoint/slug normalization.

mod cache;
pub(crate) mod fetch;
mod normalize;

pub use cache::{Cache, CacheError, CachedBody};
pub use fetch::{
    FeedUrls, FetchConfig, FetchError, Fetcher, RawFeeds, DEFAULT_REGISTRY_URL, DEFAULT_TVL_URL,
};
pub use normalize::{
    has_unresolved_placeholder, normalize_rpcs, slug_key, slug_matches, strip_trailing_slash,
};
