//! Monotonic watermark pointers with optimistic compare-and-swap.

use std::sync::Arc;

use rill_types::ContentKey;
use tracing::{debug, warn};

use crate::{CoordError, CoordStore};

/// Default coordination-store prefix for watermark nodes.
pub const DEFAULT_WATERMARK_PREFIX: &str = "/rill/watermarks/";

/// Bounded attempts for the optimistic update loop, no backoff.
const UPDATE_ATTEMPTS: usize = 3;

/// Named, monotonically advancing [`ContentKey`] pointers in the
/// coordination store.
///
/// A watermark tracks progress (e.g. "last key replicated") for consumers
/// spread across processes. Updates re-read the current version
/// immediately before every conditional write, so the stored value never
/// regresses regardless of concurrent writers; under sustained contention
/// an update may give up (bounded retry) and lag the true maximum.
///
/// All methods absorb store failures and log them instead of propagating.
pub struct WatermarkStore {
    store: Arc<dyn CoordStore>,
    prefix: String,
}

impl WatermarkStore {
    /// Watermarks under the [default prefix](DEFAULT_WATERMARK_PREFIX).
    pub fn new(store: Arc<dyn CoordStore>) -> Self {
        Self::with_prefix(store, DEFAULT_WATERMARK_PREFIX)
    }

    /// Watermarks under an explicit path prefix.
    pub fn with_prefix(store: Arc<dyn CoordStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn path(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Create the pointer with `default` if it does not exist yet.
    ///
    /// Idempotent: an existing node is success, not an error.
    pub async fn initialize(&self, name: &str, default: &ContentKey) {
        match self.store.create(&self.path(name), &default.to_bytes()).await {
            Ok(()) => {}
            // Typical on every call but the first.
            Err(CoordError::AlreadyExists(_)) => {}
            Err(e) => warn!(name, error = %e, "unable to create watermark"),
        }
    }

    /// Read the pointer, initializing it with `default` on first access.
    ///
    /// Any other read failure returns `default`.
    pub async fn get(&self, name: &str, default: &ContentKey) -> ContentKey {
        match self.read_versioned(name).await {
            Ok((key, _)) => key,
            Err(CoordError::NotFound(_)) => {
                warn!(name, "missing watermark, initializing");
                self.initialize(name, default).await;
                match self.read_versioned(name).await {
                    Ok((key, _)) => key,
                    Err(e) => {
                        warn!(name, error = %e, "unable to read watermark after initialize");
                        default.clone()
                    }
                }
            }
            Err(e) => {
                warn!(name, error = %e, "unable to read watermark");
                default.clone()
            }
        }
    }

    /// Advance the pointer to `candidate` if it is greater than the stored
    /// value.
    ///
    /// `candidate <= stored` is a no-op success. A lost race re-reads and
    /// retries the whole compare-and-write cycle up to 3 times, then gives
    /// up with a warning; the caller never sees an error.
    pub async fn update_increase(&self, name: &str, candidate: &ContentKey) {
        let path = self.path(name);
        for _ in 0..UPDATE_ATTEMPTS {
            let (current, version) = match self.read_versioned(name).await {
                Ok(read) => read,
                Err(e) => {
                    warn!(name, error = %e, "unable to read watermark for update");
                    return;
                }
            };
            if *candidate <= current {
                return;
            }
            match self
                .store
                .compare_and_set(&path, version, &candidate.to_bytes())
                .await
            {
                Ok(()) => return,
                Err(CoordError::VersionConflict { .. }) => {
                    debug!(name, "lost watermark race, retrying");
                }
                Err(e) => {
                    warn!(name, error = %e, "unable to advance watermark");
                    return;
                }
            }
        }
        warn!(name, %candidate, "giving up advancing watermark after {UPDATE_ATTEMPTS} attempts");
    }

    /// Remove the pointer. Idempotent.
    pub async fn delete(&self, name: &str) {
        if let Err(e) = self.store.delete(&self.path(name)).await {
            warn!(name, error = %e, "unable to delete watermark");
        }
    }

    async fn read_versioned(&self, name: &str) -> Result<(ContentKey, u64), CoordError> {
        let path = self.path(name);
        let versioned = self.store.read(&path).await?;
        let key =
            ContentKey::from_bytes(&versioned.value).map_err(|_| CoordError::Corrupt(path))?;
        Ok((key, versioned.version))
    }
}
