//! Error types for the placement crate.

/// Errors produced by ring construction and history maintenance.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    /// A ring snapshot was requested for an empty fleet. No safe placement
    /// decision exists in that case, so this propagates as fatal.
    #[error("ring snapshot has no spokes")]
    NoSpokes,

    /// A snapshot would break the append-only, contiguous ordering of the
    /// history (e.g. its start precedes the current snapshot's start).
    #[error("ring history is not contiguous at {at}")]
    DiscontinuousHistory {
        /// The offending snapshot's start, unix-epoch milliseconds.
        at: u64,
    },
}
