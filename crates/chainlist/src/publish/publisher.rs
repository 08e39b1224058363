//! One regeneration cycle (fetch both feeds, reconcile, swap) and the
//! fixed-interval loop around it.

use crate::chain::{FeedUrls, FetchError, Fetcher, RawFeeds};
use crate::publish::snapshot::Snapshot;
use crate::reconcile::{parse_registry, parse_tvl_feed, InvalidInputError, Reconciler};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum RegenerateError {
    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Validate and reconcile fetched feeds into a snapshot. No I/O.
pub fn build_snapshot(
    urls: &FeedUrls,
    raw: &RawFeeds,
    reconciler: &Reconciler,
) -> Result<Snapshot, InvalidInputError> {
    let registry = parse_registry(&raw.registry)?;
    let tvl_feed = parse_tvl_feed(&raw.tvl)?;
    let chains = reconciler.reconcile(&registry, &tvl_feed);
    Ok(Snapshot::new(urls, chains))
}

#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    pub interval: Duration,
    /// Stop after this many cycles (the first included). None = run forever.
    pub max_cycles: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            max_cycles: None,
        }
    }
}

/// Holds the latest completed snapshot. A cycle either replaces it whole or
/// leaves it untouched.
#[derive(Default)]
pub struct Publisher {
    current: RwLock<Option<Arc<Snapshot>>>,
    generation: AtomicU64,
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously written snapshot, so a failing first cycle is
    /// not fatal.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(snapshot))),
            generation: AtomicU64::new(0),
        }
    }

    /// Latest completed snapshot, if any cycle has succeeded.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of snapshots published by this publisher.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            generation,
            chains = snapshot.chain_count,
            created = %snapshot.created_utc_rfc3339,
            "published snapshot"
        );
        snapshot
    }

    /// Run one cycle. On error nothing is published and `latest()` is unchanged.
    pub async fn regenerate(
        &self,
        fetcher: &Fetcher,
        reconciler: &Reconciler,
    ) -> Result<Arc<Snapshot>, RegenerateError> {
        let urls = fetcher.config().feed_urls();
        let raw = fetcher.fetch_feeds(&urls).await?;
        let snapshot = build_snapshot(&urls, &raw, reconciler)?;
        Ok(self.publish(snapshot))
    }

    /// Regenerate now, then once per `schedule.interval`. Returns an error only
    /// when a cycle fails while nothing has been published yet; later failures
    /// are logged and the previous snapshot stays in effect.
    pub async fn run_every<F>(
        &self,
        fetcher: &Fetcher,
        reconciler: &Reconciler,
        schedule: &ScheduleConfig,
        mut on_publish: F,
    ) -> Result<(), RegenerateError>
    where
        F: FnMut(&Arc<Snapshot>),
    {
        let mut ticker = tokio::time::interval(schedule.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles: u64 = 0;
        loop {
            if schedule.max_cycles.is_some_and(|max| cycles >= max) {
                return Ok(());
            }
            ticker.tick().await;
            cycles += 1;
            match self.regenerate(fetcher, reconciler).await {
                Ok(snapshot) => on_publish(&snapshot),
                Err(e) if self.latest().is_none() => return Err(e),
                Err(e) => {
                    warn!(cycle = cycles, error = %e, "regeneration failed; keeping previous snapshot");
                }
            }
        }
    }
}
