//! Shared types and identifiers for Rill.
//!
//! This crate defines the core types used across the Rill workspace:
//! content keys ([`ContentKey`], [`ChannelContentKey`]), node and channel
//! identity ([`SpokeId`], [`ChannelConfig`]), query value objects
//! ([`TimeQuery`], [`DirectionQuery`]), and cluster events
//! ([`ClusterEvent`]).

use std::collections::BTreeSet;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

mod key;
mod query;

pub use key::{ChannelContentKey, ContentKey, KeyParseError};
pub use query::{Direction, DirectionQuery, Epoch, Location, Tier, TimeQuery, TimeUnit};

/// Number of spokes each channel's data is assigned to.
pub const REPLICATION_FACTOR: usize = 3;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque identifier of a storage node ("spoke").
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpokeId(String);

impl SpokeId {
    /// Create a spoke identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SpokeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SpokeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<[u8]> for SpokeId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for SpokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SpokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpokeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Configuration of a single channel: its name and the tags it belongs to.
///
/// The member-channel enumerator hands these out; tag membership can change
/// between calls and is not snapshotted mid-query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel name, unique within the hub.
    pub name: String,
    /// Tags this channel is a member of.
    pub tags: BTreeSet<String>,
}

impl ChannelConfig {
    /// Create a channel configuration with the given tags.
    pub fn new(name: impl Into<String>, tags: impl IntoIterator<Item = String>) -> Self {
        Self {
            name: name.into(),
            tags: tags.into_iter().collect(),
        }
    }

    /// Whether this channel carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A stored content item returned by value lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// The raw payload.
    pub data: Bytes,
    /// Optional media type recorded at ingest.
    pub content_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Cluster events
// ---------------------------------------------------------------------------

/// Membership changes that trigger a new ring snapshot.
///
/// Produced by the (external) cluster-membership transport and consumed by
/// the placement layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterEvent {
    /// A spoke has joined the fleet.
    SpokeJoined(SpokeId),
    /// A spoke has left the fleet (gracefully or declared dead).
    SpokeLeft(SpokeId),
}
