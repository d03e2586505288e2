//! Persistence of ring snapshots in the coordination store.
//!
//! A restarting process replays the log to resolve epochs that predate its
//! own start. Snapshots are keyed by their zero-padded `valid_from` so the
//! store's lexicographic order is chronological order.

use std::sync::Arc;

use rill_placement::{RingHistory, SpokeRing, DEFAULT_RETENTION_MS};
use tracing::debug;

use crate::{CoordError, CoordStore};

/// Default coordination-store prefix for ring snapshots.
pub const DEFAULT_RING_PREFIX: &str = "/rill/rings/";

/// Ring-snapshot log in the coordination store.
pub struct RingLog {
    store: Arc<dyn CoordStore>,
    prefix: String,
}

impl RingLog {
    /// Log under the [default prefix](DEFAULT_RING_PREFIX).
    pub fn new(store: Arc<dyn CoordStore>) -> Self {
        Self::with_prefix(store, DEFAULT_RING_PREFIX)
    }

    /// Log under an explicit path prefix.
    pub fn with_prefix(store: Arc<dyn CoordStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn path(&self, valid_from: u64) -> String {
        format!("{}{:020}", self.prefix, valid_from)
    }

    /// Write the history's retained snapshots and drop log entries that
    /// fell out of retention.
    ///
    /// Upserts every retained snapshot: sealing mutates a snapshot's
    /// `valid_until`, so the previous entry is rewritten alongside the new
    /// one.
    pub async fn record(&self, history: &RingHistory) -> Result<(), CoordError> {
        for ring in history.snapshots() {
            let bytes = postcard::to_allocvec(ring)?;
            self.store.put(&self.path(ring.valid_from()), &bytes).await?;
        }
        if let Some(oldest) = history.snapshots().first() {
            let floor = self.path(oldest.valid_from());
            for path in self.store.list(&self.prefix).await? {
                if path < floor {
                    debug!(path, "pruning ring snapshot from log");
                    self.store.delete(&path).await?;
                }
            }
        }
        Ok(())
    }

    /// Replay the log into a history with the default retention bound.
    pub async fn load(&self) -> Result<RingHistory, CoordError> {
        self.load_with_retention(DEFAULT_RETENTION_MS).await
    }

    /// Replay the log into a history with an explicit retention bound.
    pub async fn load_with_retention(&self, retention_ms: u64) -> Result<RingHistory, CoordError> {
        let mut paths = self.store.list(&self.prefix).await?;
        paths.sort();
        let mut snapshots: Vec<SpokeRing> = Vec::with_capacity(paths.len());
        for path in paths {
            let versioned = self.store.read(&path).await?;
            snapshots.push(postcard::from_bytes(&versioned.value)?);
        }
        Ok(RingHistory::restore(snapshots, retention_ms)?)
    }
}
