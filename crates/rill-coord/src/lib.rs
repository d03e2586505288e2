//! Coordination-store plumbing for Rill.
//!
//! The coordination store is the only cross-process mutable state the
//! placement and aggregation layers rely on. This crate provides:
//!
//! - [`CoordStore`] — the narrow interface a coordination service must
//!   expose: create-if-absent, versioned read, versioned conditional
//!   write, unconditional write, delete, and prefix listing.
//! - [`MemoryCoordStore`] — in-process implementation for tests and
//!   single-node use.
//! - [`FjallCoordStore`] — persistent implementation over a local Fjall
//!   keyspace.
//! - [`WatermarkStore`] — named, monotonically advancing
//!   [`ContentKey`](rill_types::ContentKey) pointers with optimistic
//!   compare-and-swap updates.
//! - [`RingLog`] — ring-snapshot persistence so a restarting process can
//!   resolve old epochs.

mod error;
mod ring_log;
mod store;
mod watermark;

pub use error::CoordError;
pub use ring_log::{RingLog, DEFAULT_RING_PREFIX};
pub use store::{CoordStore, FjallCoordStore, MemoryCoordStore, Versioned};
pub use watermark::{WatermarkStore, DEFAULT_WATERMARK_PREFIX};
