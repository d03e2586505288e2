//! [`TagAggregator`] — fan-out and global merge across a tag's channels.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use rill_types::{
    ChannelConfig, ChannelContentKey, Content, ContentKey, Direction, DirectionQuery, TimeQuery,
};
use tracing::{debug, warn};

use crate::{ChannelError, TagError};

/// Enumerates the channels belonging to a tag.
///
/// Membership can change between calls; the aggregator re-enumerates on
/// every query and does not snapshot membership mid-query.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// The channels whose tag set currently includes `tag`.
    async fn channels_for_tag(&self, tag: &str) -> Result<Vec<ChannelConfig>, ChannelError>;
}

/// Per-channel query primitives the aggregator fans out to.
///
/// Implementations answer for a single channel; timeouts and retries are
/// their responsibility, and a timed-out channel is treated exactly like a
/// failed one (excluded from the merge).
#[async_trait]
pub trait ChannelQuerier: Send + Sync {
    /// Every key in the query's time bucket, ascending.
    async fn query_by_time(
        &self,
        channel: &str,
        query: &TimeQuery,
    ) -> Result<BTreeSet<ContentKey>, ChannelError>;

    /// Up to `count` keys next or previous of the anchor, ascending.
    async fn query(
        &self,
        channel: &str,
        query: &DirectionQuery,
    ) -> Result<BTreeSet<ContentKey>, ChannelError>;

    /// The channel's most recent key, if it has any.
    async fn latest(
        &self,
        channel: &str,
        query: &DirectionQuery,
    ) -> Result<Option<ContentKey>, ChannelError>;

    /// Up to `count` of the channel's oldest keys, ascending.
    async fn earliest(
        &self,
        channel: &str,
        query: &DirectionQuery,
    ) -> Result<BTreeSet<ContentKey>, ChannelError>;

    /// The content stored under a key, if present.
    async fn get(&self, channel: &str, key: &ContentKey)
        -> Result<Option<Content>, ChannelError>;
}

/// Queries a tag's member channels as one logical stream.
pub struct TagAggregator {
    directory: Arc<dyn ChannelDirectory>,
    querier: Arc<dyn ChannelQuerier>,
}

impl TagAggregator {
    /// Build an aggregator over the given collaborators.
    pub fn new(directory: Arc<dyn ChannelDirectory>, querier: Arc<dyn ChannelQuerier>) -> Self {
        Self { directory, querier }
    }

    /// The tag's current member channels.
    pub async fn channels(&self, tag: &str) -> Result<Vec<ChannelConfig>, TagError> {
        self.directory
            .channels_for_tag(tag)
            .await
            .map_err(|source| TagError::Directory {
                tag: tag.to_string(),
                source,
            })
    }

    /// Everything in one time bucket across the tag, globally ascending.
    pub async fn query_by_time(
        &self,
        tag: &str,
        query: &TimeQuery,
    ) -> Result<BTreeSet<ChannelContentKey>, TagError> {
        let channels = self.channels(tag).await?;
        let query = query.clone();
        let trace = query.trace;
        let results = self
            .fan_out(tag, channels, move |querier, channel| {
                let query = query.clone();
                async move { querier.query_by_time(&channel, &query).await }
            })
            .await;
        if trace {
            for (channel, keys) in &results {
                debug!(tag, %channel, count = keys.len(), "member bucket contribution");
            }
        }
        Ok(merge(results))
    }

    /// Up to `count` keys next or previous of the anchor, across the tag.
    ///
    /// The union is merged in ascending order first and only then
    /// truncated, so the globally earliest (or latest) `count` items win
    /// regardless of which channel they came from. `Previous` results are
    /// returned newest first.
    pub async fn get_keys(
        &self,
        tag: &str,
        query: &DirectionQuery,
    ) -> Result<Vec<ChannelContentKey>, TagError> {
        let channels = self.channels(tag).await?;
        let fan_query = query.clone();
        let results = self
            .fan_out(tag, channels, move |querier, channel| {
                let query = fan_query.clone();
                async move { querier.query(&channel, &query).await }
            })
            .await;
        if query.trace {
            for (channel, keys) in &results {
                debug!(tag, %channel, count = keys.len(), "member direction contribution");
            }
        }
        let merged = merge(results);
        let keys = match query.direction {
            Direction::Next => merged.into_iter().take(query.count).collect(),
            Direction::Previous => merged.into_iter().rev().take(query.count).collect(),
        };
        Ok(keys)
    }

    /// The single most recent key across the tag, if any member has one.
    pub async fn get_latest(
        &self,
        tag: &str,
        query: &DirectionQuery,
    ) -> Result<Option<ChannelContentKey>, TagError> {
        let channels = self.channels(tag).await?;
        let fan_query = query.clone();
        let results = self
            .fan_out(tag, channels, move |querier, channel| {
                let query = fan_query.clone();
                async move { querier.latest(&channel, &query).await }
            })
            .await;
        Ok(results
            .into_iter()
            .filter_map(|(channel, key)| key.map(|k| ChannelContentKey::new(channel, k)))
            .max())
    }

    /// Up to `count` of the oldest keys across the tag, ascending.
    pub async fn get_earliest(
        &self,
        tag: &str,
        query: &DirectionQuery,
    ) -> Result<BTreeSet<ChannelContentKey>, TagError> {
        let channels = self.channels(tag).await?;
        let fan_query = query.clone();
        let results = self
            .fan_out(tag, channels, move |querier, channel| {
                let query = fan_query.clone();
                async move { querier.earliest(&channel, &query).await }
            })
            .await;
        Ok(merge(results).into_iter().take(query.count).collect())
    }

    /// Look a key up across the tag's members.
    ///
    /// Probes members in enumeration order and returns the first present
    /// value. Best-effort: if two member channels hold byte-identical
    /// keys, whichever enumerates first wins.
    pub async fn get_value(&self, tag: &str, key: &ContentKey) -> Result<Option<Content>, TagError> {
        for channel in self.channels(tag).await? {
            match self.querier.get(&channel.name, key).await {
                Ok(Some(content)) => return Ok(Some(content)),
                Ok(None) => {}
                Err(error) => {
                    warn!(tag, channel = %channel.name, %error, "member value lookup failed");
                }
            }
        }
        Ok(None)
    }

    /// Run one per-channel operation concurrently across all members.
    ///
    /// Each member runs in its own task; there is no shared mutable state
    /// between them, and completion order is irrelevant because callers
    /// re-sort the union. Failures are logged and drop that member's
    /// contribution.
    async fn fan_out<T, F, Fut>(
        &self,
        tag: &str,
        channels: Vec<ChannelConfig>,
        op: F,
    ) -> Vec<(String, T)>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn ChannelQuerier>, String) -> Fut,
        Fut: Future<Output = Result<T, ChannelError>> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(channels.len());
        for channel in channels {
            let future = op(self.querier.clone(), channel.name.clone());
            handles.push((channel.name, tokio::spawn(future)));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (channel, handle) in handles {
            match handle.await {
                Ok(Ok(value)) => results.push((channel, value)),
                Ok(Err(error)) => {
                    warn!(tag, %channel, %error, "member query failed, excluding from merge");
                }
                Err(error) => {
                    warn!(tag, %channel, %error, "member query task panicked");
                }
            }
        }
        results
    }
}

impl std::fmt::Debug for TagAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagAggregator").finish_non_exhaustive()
    }
}

/// Union per-channel key sets into the global merge order.
fn merge(results: Vec<(String, BTreeSet<ContentKey>)>) -> BTreeSet<ChannelContentKey> {
    let mut merged = BTreeSet::new();
    for (channel, keys) in results {
        for key in keys {
            merged.insert(ChannelContentKey::new(channel.clone(), key));
        }
    }
    merged
}
