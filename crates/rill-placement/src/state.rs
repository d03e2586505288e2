//! Cluster view: live fleet membership and the ring history it drives.
//!
//! [`ClusterView`] is the shared, read-mostly value that other components
//! (replication, tag queries, the control tool) use to find out who is in
//! the fleet and where channels belong. There is no process-wide singleton:
//! whoever makes placement decisions owns an `Arc<ClusterView>` and hands
//! it to callers.

use std::collections::BTreeSet;
use std::sync::Arc;

use rill_types::{ClusterEvent, SpokeId};
use tokio::sync::{broadcast, RwLock};
use tracing::info;

use crate::{PlacementError, Replicas, RingHistory};

/// Shared cluster state maintained from membership events.
///
/// Holds the current fleet, the ring history, and a broadcast channel
/// through which other components can subscribe to membership changes.
pub struct ClusterView {
    /// Current fleet members.
    members: RwLock<BTreeSet<SpokeId>>,
    /// Ring snapshots, current and retained past epochs.
    history: RwLock<RingHistory>,
    /// Broadcast channel for rebroadcasting applied events.
    event_tx: broadcast::Sender<ClusterEvent>,
}

impl ClusterView {
    /// Create a view for an initial fleet, cutting the genesis snapshot at
    /// `now`.
    pub fn new(
        now: u64,
        initial: impl IntoIterator<Item = SpokeId>,
    ) -> Result<Arc<Self>, PlacementError> {
        let members: BTreeSet<SpokeId> = initial.into_iter().collect();
        let mut history = RingHistory::new();
        history.apply(now, members.iter().cloned())?;
        let (event_tx, _) = broadcast::channel(256);
        Ok(Arc::new(Self {
            members: RwLock::new(members),
            history: RwLock::new(history),
            event_tx,
        }))
    }

    /// Rebuild a view from a restored history (e.g. replayed from the
    /// coordination store). The fleet is taken from the current snapshot.
    pub fn from_history(history: RingHistory) -> Result<Arc<Self>, PlacementError> {
        let members: BTreeSet<SpokeId> = history
            .current()
            .ok_or(PlacementError::NoSpokes)?
            .ring_order()
            .iter()
            .cloned()
            .collect();
        let (event_tx, _) = broadcast::channel(256);
        Ok(Arc::new(Self {
            members: RwLock::new(members),
            history: RwLock::new(history),
            event_tx,
        }))
    }

    /// Subscribe to membership events applied to this view.
    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.event_tx.subscribe()
    }

    /// Apply a membership event, cutting a new ring snapshot at `now`.
    ///
    /// Events that do not change the fleet (re-join of a member, departure
    /// of a stranger) are ignored. Removing the last spoke is rejected:
    /// the previous snapshot stays open because no valid successor exists.
    pub async fn apply_event(&self, now: u64, event: ClusterEvent) -> Result<(), PlacementError> {
        let mut members = self.members.write().await;
        match &event {
            ClusterEvent::SpokeJoined(spoke) => {
                if !members.insert(spoke.clone()) {
                    return Ok(());
                }
                info!(%spoke, "spoke joined fleet");
            }
            ClusterEvent::SpokeLeft(spoke) => {
                if members.len() == 1 && members.contains(spoke) {
                    return Err(PlacementError::NoSpokes);
                }
                if !members.remove(spoke) {
                    return Ok(());
                }
                info!(%spoke, "spoke left fleet");
            }
        }
        {
            let mut history = self.history.write().await;
            history.apply(now, members.iter().cloned())?;
        }
        let _ = self.event_tx.send(event);
        Ok(())
    }

    /// Snapshot of the current fleet.
    pub async fn members(&self) -> Vec<SpokeId> {
        self.members.read().await.iter().cloned().collect()
    }

    /// Number of spokes currently in the fleet.
    pub async fn member_count(&self) -> usize {
        self.members.read().await.len()
    }

    /// Resolve a channel against the current snapshot.
    pub async fn current_servers(&self, channel: &str) -> Option<Replicas> {
        self.history.read().await.current_servers(channel)
    }

    /// Resolve a channel against the snapshot governing `at`.
    pub async fn servers_at(&self, channel: &str, at: u64) -> Option<Replicas> {
        self.history.read().await.servers_at(channel, at)
    }

    /// Resolve a channel for a whole range; `None` if the range straddles
    /// a topology change or leaves retained history.
    pub async fn servers_in_range(&self, channel: &str, start: u64, end: u64) -> Option<Replicas> {
        self.history.read().await.servers_in_range(channel, start, end)
    }

    /// Clone of the full retained history (for persistence).
    pub async fn history(&self) -> RingHistory {
        self.history.read().await.clone()
    }
}

impl std::fmt::Debug for ClusterView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterView").finish_non_exhaustive()
    }
}
