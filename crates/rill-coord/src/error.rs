//! Error types for the coordination layer.

/// Errors returned by coordination-store operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordError {
    /// Create-if-absent found an existing node.
    #[error("node already exists: {0}")]
    AlreadyExists(String),

    /// The requested node does not exist.
    #[error("node not found: {0}")]
    NotFound(String),

    /// A conditional write lost a race against a concurrent writer.
    #[error("version conflict at {path}: expected {expected}, actual {actual}")]
    VersionConflict {
        /// Path of the contested node.
        path: String,
        /// Version the writer expected.
        expected: u64,
        /// Version actually stored.
        actual: u64,
    },

    /// A stored value failed to decode.
    #[error("corrupt value at {0}")]
    Corrupt(String),

    /// Fjall database error.
    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    /// I/O error (e.g. from Fjall guard operations).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] postcard::Error),

    /// Persisted ring snapshots do not form a valid history.
    #[error("ring history error: {0}")]
    History(#[from] rill_placement::PlacementError),
}
