//! Consistent-hash placement of channels onto spokes, with epoch history.
//!
//! This crate decides *where* channel data lives and *when* that decision
//! was valid:
//!
//! - [`SpokeRing`] — an immutable snapshot of the fleet with deterministic
//!   replica placement over a hashed ring of equal arcs.
//! - [`RingHistory`] — an append-only sequence of snapshots with contiguous
//!   validity windows; resolves which snapshot governed ownership at a
//!   point in time or over a range.
//! - [`ClusterView`] — shared read-mostly state that cuts new snapshots in
//!   response to [`ClusterEvent`](rill_types::ClusterEvent)s.
//!
//! Placement is a pure function of the channel name and the spoke set:
//! each spoke is mapped to a point in a u64 hash space via
//! `blake3(spoke_id)`, fixing a ring order; the space is split into equal
//! arcs in that order, and a channel walks the ring from its own hashed
//! arc collecting distinct spokes.

mod error;
mod history;
mod ring;
mod state;

pub use error::PlacementError;
pub use history::{RingHistory, DEFAULT_RETENTION_MS};
pub use ring::{Replicas, SpokeRing};
pub use state::ClusterView;
