//! Error types for tag aggregation.

/// Failure of a single per-channel query during fan-out.
///
/// These are produced by [`ChannelQuerier`](crate::ChannelQuerier)
/// implementations. The aggregator absorbs them: a failing member is
/// logged and excluded from the merge.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel's replica set could not be reached.
    #[error("channel unreachable: {0}")]
    Unreachable(String),

    /// The per-channel query did not complete in time.
    #[error("channel query timed out")]
    Timeout,

    /// The backing store failed to answer.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Errors that fail a whole tag-level query.
///
/// Only structural failures land here; per-member failures are absorbed.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// The member-channel enumerator failed — without the member list no
    /// meaningful tag-level answer exists.
    #[error("unable to enumerate channels for tag {tag}: {source}")]
    Directory {
        /// The tag being queried.
        tag: String,
        /// The enumerator's failure.
        source: ChannelError,
    },
}
