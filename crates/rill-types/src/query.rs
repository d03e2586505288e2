//! Query value objects shared by channel-level and tag-level navigation.

use serde::{Deserialize, Serialize};

use crate::ContentKey;

/// Calendar bucket granularity for time queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    /// One second.
    Second,
    /// One minute.
    Minute,
    /// One hour.
    Hour,
    /// One UTC day.
    Day,
}

impl TimeUnit {
    /// Width of this bucket in milliseconds.
    pub const fn bucket_ms(&self) -> u64 {
        match self {
            TimeUnit::Second => 1_000,
            TimeUnit::Minute => 60_000,
            TimeUnit::Hour => 3_600_000,
            TimeUnit::Day => 86_400_000,
        }
    }

    /// Truncate a millisecond timestamp to the start of its bucket.
    pub const fn start_of(&self, millis: u64) -> u64 {
        millis - millis % self.bucket_ms()
    }
}

/// Navigation direction relative to an anchor key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Items strictly after the anchor, oldest first.
    Next,
    /// Items strictly before the anchor, newest first.
    Previous,
}

/// A physical storage tier holding channel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// The short-retention spoke cache.
    Cache,
    /// The long-term store.
    LongTerm,
}

/// Which storage tiers a query consults.
///
/// A closed enumeration with a fixed dispatch table; per-query tier
/// selection never inspects runtime types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// Consult every tier.
    #[default]
    All,
    /// Only the spoke cache.
    Cache,
    /// Only the long-term store.
    LongTerm,
}

impl Location {
    /// The tiers this location resolves to, in consultation order.
    pub const fn tiers(&self) -> &'static [Tier] {
        match self {
            Location::All => &[Tier::Cache, Tier::LongTerm],
            Location::Cache => &[Tier::Cache],
            Location::LongTerm => &[Tier::LongTerm],
        }
    }
}

/// Which mutability epoch of a channel a query covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Epoch {
    /// Both epochs.
    #[default]
    All,
    /// Only data past the channel's mutable horizon.
    Immutable,
    /// Only data still within the mutable horizon.
    Mutable,
}

impl Epoch {
    /// Whether a query scoped to `self` covers data in `other`.
    pub const fn includes(&self, other: Epoch) -> bool {
        matches!(
            (*self, other),
            (Epoch::All, _)
                | (Epoch::Immutable, Epoch::Immutable)
                | (Epoch::Mutable, Epoch::Mutable)
        )
    }
}

/// A bucket-complete time query: everything in one calendar bucket.
///
/// Immutable value object. Tag-level callers fan the same query out to
/// every member channel; the channel name travels next to the query, not
/// inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeQuery {
    /// Start of the bucket, unix-epoch milliseconds, truncated to `unit`.
    pub start: u64,
    /// Bucket granularity.
    pub unit: TimeUnit,
    /// Only include durably committed data.
    pub stable: bool,
    /// Storage tiers to consult.
    pub location: Location,
    /// Mutability epoch to consult.
    pub epoch: Epoch,
    /// Emit per-step trace output for this query.
    pub trace: bool,
}

impl TimeQuery {
    /// Query for the bucket of `unit` containing `millis`.
    pub fn new(millis: u64, unit: TimeUnit) -> Self {
        Self {
            start: unit.start_of(millis),
            unit,
            stable: true,
            location: Location::All,
            epoch: Epoch::All,
            trace: false,
        }
    }

    /// Exclusive end of the bucket, in milliseconds.
    pub const fn end(&self) -> u64 {
        self.start + self.unit.bucket_ms()
    }

    /// Whether a key's timestamp falls inside the bucket.
    pub const fn contains(&self, millis: u64) -> bool {
        millis >= self.start && millis < self.end()
    }
}

/// A direction query: up to `count` items next or previous of an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionQuery {
    /// The anchor key; results exclude the anchor itself.
    pub anchor: ContentKey,
    /// Walk direction from the anchor.
    pub direction: Direction,
    /// Only include durably committed data.
    pub stable: bool,
    /// Storage tiers to consult.
    pub location: Location,
    /// Mutability epoch to consult.
    pub epoch: Epoch,
    /// Maximum number of items to return.
    pub count: usize,
    /// Emit per-step trace output for this query.
    pub trace: bool,
}

impl DirectionQuery {
    /// Query for `count` items in `direction` of `anchor`.
    pub fn new(anchor: ContentKey, direction: Direction, count: usize) -> Self {
        Self {
            anchor,
            direction,
            stable: true,
            location: Location::All,
            epoch: Epoch::All,
            count,
            trace: false,
        }
    }
}
