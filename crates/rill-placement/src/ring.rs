//! Immutable ring snapshots and deterministic replica placement.

use std::collections::BTreeSet;

use rill_types::{SpokeId, REPLICATION_FACTOR};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::PlacementError;

/// The replica set resolved for one channel: an ordered list of distinct
/// spokes, first owner first.
///
/// When the fleet is smaller than the replication factor the set holds
/// every available spoke and [`is_under_replicated`](Self::is_under_replicated)
/// reports the shortfall; the condition is never silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replicas {
    spokes: Vec<SpokeId>,
}

impl Replicas {
    /// The owning spokes, in walk order.
    pub fn spokes(&self) -> &[SpokeId] {
        &self.spokes
    }

    /// Whether fewer than the replication factor of spokes own the channel.
    pub fn is_under_replicated(&self) -> bool {
        self.spokes.len() < REPLICATION_FACTOR
    }

    /// Whether the given spoke is one of the owners.
    pub fn contains(&self, spoke: &SpokeId) -> bool {
        self.spokes.contains(spoke)
    }

    /// Number of owning spokes.
    pub fn len(&self) -> usize {
        self.spokes.len()
    }

    /// Whether the set is empty (never produced by a valid snapshot).
    pub fn is_empty(&self) -> bool {
        self.spokes.is_empty()
    }
}

impl IntoIterator for Replicas {
    type Item = SpokeId;
    type IntoIter = std::vec::IntoIter<SpokeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.spokes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Replicas {
    type Item = &'a SpokeId;
    type IntoIter = std::slice::Iter<'a, SpokeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.spokes.iter()
    }
}

/// An immutable assignment of the hash space to a fixed fleet of spokes,
/// captured at a point in time.
///
/// Spokes are ordered around the ring by `blake3(spoke_id)`; the u64 hash
/// space is then divided into equal arcs assigned in that order. A channel
/// hashes to a point, and its replica set is the run of
/// [`REPLICATION_FACTOR`] distinct spokes starting at the arc containing
/// that point, wrapping around the ring at most once. Placement depends
/// only on the channel name and the spoke set, never on how the fleet
/// list was assembled.
///
/// `valid_until` is `None` while this is the current snapshot and is set
/// exactly once when a newer snapshot supersedes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpokeRing {
    valid_from: u64,
    valid_until: Option<u64>,
    /// Spokes in ring order.
    spokes: Vec<SpokeId>,
}

impl SpokeRing {
    /// Create a snapshot valid from `valid_from` for the given fleet.
    ///
    /// Duplicate spoke ids are collapsed. An empty fleet is a structural
    /// error: no safe placement decision exists.
    pub fn new(
        valid_from: u64,
        spokes: impl IntoIterator<Item = SpokeId>,
    ) -> Result<Self, PlacementError> {
        let unique: BTreeSet<SpokeId> = spokes.into_iter().collect();
        if unique.is_empty() {
            return Err(PlacementError::NoSpokes);
        }
        let mut ordered: Vec<SpokeId> = unique.into_iter().collect();
        ordered.sort_by(|a, b| {
            ring_position(a.as_ref())
                .cmp(&ring_position(b.as_ref()))
                .then_with(|| a.cmp(b))
        });
        Ok(Self {
            valid_from,
            valid_until: None,
            spokes: ordered,
        })
    }

    /// Start of the validity window, unix-epoch milliseconds.
    pub fn valid_from(&self) -> u64 {
        self.valid_from
    }

    /// End of the validity window; `None` while this snapshot is current.
    pub fn valid_until(&self) -> Option<u64> {
        self.valid_until
    }

    /// Whether this snapshot is still the current one.
    pub fn is_open(&self) -> bool {
        self.valid_until.is_none()
    }

    /// Close the validity window. Called exactly once, by the history,
    /// when a newer snapshot supersedes this one.
    pub(crate) fn seal(&mut self, until: u64) {
        self.valid_until = Some(until);
    }

    /// Number of spokes in the fleet.
    pub fn spoke_count(&self) -> usize {
        self.spokes.len()
    }

    /// The fleet in ring order.
    pub fn ring_order(&self) -> &[SpokeId] {
        &self.spokes
    }

    /// Resolve the replica set for a channel.
    ///
    /// Pure and deterministic: the same channel name and fleet always
    /// yield the same result, so callers never need a lookup table.
    pub fn servers(&self, channel: &str) -> Replicas {
        let n = self.spokes.len();
        let start = arc_index(ring_position(channel.as_bytes()), n);
        let take = REPLICATION_FACTOR.min(n);
        let spokes: Vec<SpokeId> = (0..take)
            .map(|i| self.spokes[(start + i) % n].clone())
            .collect();
        if spokes.len() < REPLICATION_FACTOR {
            warn!(
                channel,
                replicas = spokes.len(),
                "fleet smaller than replication factor, channel under-replicated"
            );
        }
        Replicas { spokes }
    }
}

/// Map bytes to a point in the u64 hash space: blake3 truncated to 8 bytes.
fn ring_position(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[..8].try_into().expect("8 bytes");
    u64::from_le_bytes(bytes)
}

/// Which of `n` equal arcs a point falls into (multiply-shift, no modulo
/// bias).
fn arc_index(pos: u64, n: usize) -> usize {
    ((pos as u128 * n as u128) >> 64) as usize
}
