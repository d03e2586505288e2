//! Cross-channel aggregation: querying a tag as one time-ordered stream.
//!
//! A tag groups independently replicated channels. [`TagAggregator`] fans
//! a single logical query out to every member channel through the
//! [`ChannelQuerier`] collaborator, then merges the per-channel results
//! into one globally ordered answer under the
//! [`ChannelContentKey`](rill_types::ChannelContentKey) ordering (time
//! first, channel name as tie-break).
//!
//! Member failures during fan-out are absorbed: an unreachable channel is
//! logged and contributes nothing, it never fails the tag-level query.

mod aggregator;
mod error;


pub use aggregator::{ChannelDirectory, ChannelQuerier, TagAggregator};
pub use error::{ChannelError, TagError};
