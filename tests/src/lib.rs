//! Shared test harness for Rill integration tests.
//!
//! Provides [`MemoryHub`] — an in-memory channel directory and per-channel
//! query collaborator with failure injection — plus small helpers for
//! building keys. Integration tests wire it to the real [`TagAggregator`],
//! cluster view and coordination stores.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use rill_tag::{ChannelDirectory, ChannelError, ChannelQuerier, TagAggregator};
use rill_types::{
    ChannelConfig, Content, ContentKey, Direction, DirectionQuery, TimeQuery,
};

/// In-memory hub of channels and their keys.
///
/// Channels can be added, keys ingested and spokes "taken down" while an
/// aggregator is live, which is exactly what the membership-can-change
/// and partial-failure scenarios need. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryHub {
    inner: Arc<RwLock<HubState>>,
}

#[derive(Default)]
struct HubState {
    channels: Vec<ChannelConfig>,
    keys: BTreeMap<String, BTreeSet<ContentKey>>,
    down: HashSet<String>,
}

impl MemoryHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel with the given tags.
    pub fn add_channel(&self, name: &str, tags: impl IntoIterator<Item = String>) {
        let mut state = self.inner.write().unwrap();
        state.channels.push(ChannelConfig::new(name, tags));
        state.keys.entry(name.to_string()).or_default();
    }

    /// Append a key to a channel.
    pub fn ingest(&self, channel: &str, key: ContentKey) {
        let mut state = self.inner.write().unwrap();
        state.keys.entry(channel.to_string()).or_default().insert(key);
    }

    /// Make a channel unreachable (or reachable again).
    pub fn set_down(&self, channel: &str, down: bool) {
        let mut state = self.inner.write().unwrap();
        if down {
            state.down.insert(channel.to_string());
        } else {
            state.down.remove(channel);
        }
    }

    /// Build an aggregator over this hub.
    pub fn aggregator(&self) -> TagAggregator {
        let hub = Arc::new(self.clone());
        TagAggregator::new(hub.clone(), hub)
    }

    fn keys_for(&self, channel: &str) -> Result<BTreeSet<ContentKey>, ChannelError> {
        let state = self.inner.read().unwrap();
        if state.down.contains(channel) {
            return Err(ChannelError::Unreachable(channel.to_string()));
        }
        Ok(state.keys.get(channel).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ChannelDirectory for MemoryHub {
    async fn channels_for_tag(&self, tag: &str) -> Result<Vec<ChannelConfig>, ChannelError> {
        let state = self.inner.read().unwrap();
        Ok(state
            .channels
            .iter()
            .filter(|c| c.has_tag(tag))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ChannelQuerier for MemoryHub {
    async fn query_by_time(
        &self,
        channel: &str,
        query: &TimeQuery,
    ) -> Result<BTreeSet<ContentKey>, ChannelError> {
        Ok(self
            .keys_for(channel)?
            .into_iter()
            .filter(|k| query.contains(k.millis()))
            .collect())
    }

    async fn query(
        &self,
        channel: &str,
        query: &DirectionQuery,
    ) -> Result<BTreeSet<ContentKey>, ChannelError> {
        let keys = self.keys_for(channel)?;
        Ok(match query.direction {
            Direction::Next => keys
                .into_iter()
                .filter(|k| *k > query.anchor)
                .take(query.count)
                .collect(),
            Direction::Previous => keys
                .into_iter()
                .filter(|k| *k < query.anchor)
                .rev()
                .take(query.count)
                .collect(),
        })
    }

    async fn latest(
        &self,
        channel: &str,
        _query: &DirectionQuery,
    ) -> Result<Option<ContentKey>, ChannelError> {
        Ok(self.keys_for(channel)?.into_iter().next_back())
    }

    async fn earliest(
        &self,
        channel: &str,
        query: &DirectionQuery,
    ) -> Result<BTreeSet<ContentKey>, ChannelError> {
        Ok(self
            .keys_for(channel)?
            .into_iter()
            .take(query.count)
            .collect())
    }

    async fn get(
        &self,
        channel: &str,
        key: &ContentKey,
    ) -> Result<Option<Content>, ChannelError> {
        Ok(self.keys_for(channel)?.contains(key).then(|| Content {
            data: Bytes::from(format!("{channel}:{key}")),
            content_type: Some("application/octet-stream".to_string()),
        }))
    }
}

/// Key at `minutes` past the epoch hour with a fixed discriminator.
pub fn key_at(minutes: u64) -> ContentKey {
    ContentKey::new(minutes * 60_000, "00a")
}

/// Key at `minutes` past the epoch hour with an explicit discriminator.
pub fn key_with(minutes: u64, hash: &str) -> ContentKey {
    ContentKey::new(minutes * 60_000, hash)
}
