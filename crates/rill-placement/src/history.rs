//! Epoch resolution: which ring snapshot governed ownership at a time.

use rill_types::SpokeId;

use crate::{PlacementError, Replicas, SpokeRing};

/// How long past snapshots stay answerable, in milliseconds.
///
/// Matches the spoke cache TTL: once data has aged out of every spoke
/// cache there is no point resolving who owned it. The genesis snapshot
/// also answers for up to this long *before* its start, covering data that
/// was already live in spoke caches when ring tracking began.
pub const DEFAULT_RETENTION_MS: u64 = 60 * 60 * 1000;

/// An ordered, append-only sequence of ring snapshots with contiguous,
/// non-overlapping validity windows; at most the last snapshot is open.
///
/// Queries outside retained history return `None` — an explicit
/// "don't know" — never a stale or partially-correct owner set.
#[derive(Debug, Clone)]
pub struct RingHistory {
    /// Snapshots, oldest first, newest last.
    snapshots: Vec<SpokeRing>,
    retention_ms: u64,
    /// Start of the first snapshot ever applied, while it is retained.
    /// Only the genesis snapshot answers for the grace window before its
    /// own start; once it is pruned the early region is simply unknown.
    genesis_from: Option<u64>,
}

impl RingHistory {
    /// Empty history with the default retention bound.
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION_MS)
    }

    /// Empty history with an explicit retention bound in milliseconds.
    pub fn with_retention(retention_ms: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            retention_ms,
            genesis_from: None,
        }
    }

    /// Rebuild a history from persisted snapshots, oldest first.
    ///
    /// Windows must be contiguous and ascending with at most the last one
    /// open; anything else indicates a corrupt log. A restored history
    /// grants no grace window: whether the oldest persisted snapshot was
    /// the genesis one is unknowable after pruning, and wrongly answering
    /// for a pruned epoch is worse than an explicit unknown.
    pub fn restore(
        snapshots: Vec<SpokeRing>,
        retention_ms: u64,
    ) -> Result<Self, PlacementError> {
        for pair in snapshots.windows(2) {
            let sealed_at = pair[0].valid_until();
            if sealed_at != Some(pair[1].valid_from()) {
                return Err(PlacementError::DiscontinuousHistory {
                    at: pair[1].valid_from(),
                });
            }
        }
        Ok(Self {
            snapshots,
            retention_ms,
            genesis_from: None,
        })
    }

    /// Cut a new snapshot for the given fleet, sealing the current one.
    ///
    /// The previous snapshot's window ends where the new one begins, so
    /// windows stay contiguous. Snapshots sealed longer than the retention
    /// bound ago are pruned.
    pub fn apply(
        &mut self,
        now: u64,
        spokes: impl IntoIterator<Item = SpokeId>,
    ) -> Result<&SpokeRing, PlacementError> {
        if let Some(last) = self.snapshots.last() {
            if now < last.valid_from() {
                return Err(PlacementError::DiscontinuousHistory { at: now });
            }
        }
        let ring = SpokeRing::new(now, spokes)?;
        if let Some(last) = self.snapshots.last_mut() {
            last.seal(now);
        }
        if self.genesis_from.is_none() {
            self.genesis_from = Some(now);
        }
        self.snapshots.push(ring);
        self.prune(now);
        Ok(self.snapshots.last().expect("just appended"))
    }

    /// Drop snapshots sealed longer than the retention bound ago.
    fn prune(&mut self, now: u64) {
        let cutoff = now.saturating_sub(self.retention_ms);
        self.snapshots
            .retain(|ring| ring.valid_until().map_or(true, |until| until > cutoff));
    }

    /// The open snapshot, if any.
    pub fn current(&self) -> Option<&SpokeRing> {
        self.snapshots.last().filter(|ring| ring.is_open())
    }

    /// Retained snapshots, oldest first.
    pub fn snapshots(&self) -> &[SpokeRing] {
        &self.snapshots
    }

    /// Resolve a channel against the current snapshot.
    pub fn current_servers(&self, channel: &str) -> Option<Replicas> {
        self.current().map(|ring| ring.servers(channel))
    }

    /// Resolve a channel against the snapshot governing `at`.
    ///
    /// Returns `None` when no retained snapshot covers `at`.
    pub fn servers_at(&self, channel: &str, at: u64) -> Option<Replicas> {
        self.covering(at).map(|ring| ring.servers(channel))
    }

    /// Resolve a channel for the whole range `[start, end]`.
    ///
    /// Answers only when a single snapshot's window covers the entire
    /// range; a range that straddles a topology change or leaves retained
    /// history returns `None`, and the caller must split it by epoch. A
    /// range ending exactly on a seal boundary counts as covered by the
    /// older snapshot.
    pub fn servers_in_range(&self, channel: &str, start: u64, end: u64) -> Option<Replicas> {
        if end < start {
            return None;
        }
        let ring = self.covering(start)?;
        let until = ring.valid_until().unwrap_or(u64::MAX);
        if end <= until {
            Some(ring.servers(channel))
        } else {
            None
        }
    }

    /// Find the snapshot whose validity window contains `at`.
    fn covering(&self, at: u64) -> Option<&SpokeRing> {
        for (idx, ring) in self.snapshots.iter().enumerate() {
            let mut from = ring.valid_from();
            if idx == 0 && self.genesis_from == Some(from) {
                from = from.saturating_sub(self.retention_ms);
            }
            let until = ring.valid_until().unwrap_or(u64::MAX);
            if at >= from && at < until {
                return Some(ring);
            }
        }
        None
    }
}

impl Default for RingHistory {
    fn default() -> Self {
        Self::new()
    }
}
