//! Content keys: the totally ordered identifiers of channel items.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A totally ordered content identifier.
///
/// A key is a millisecond-resolution timestamp plus a discriminator string
/// (a sequence or a hash) that breaks ties among keys sharing the same
/// millisecond. Ordering is `(millis, hash)` lexicographic, which the
/// derived `Ord` provides through field order.
///
/// Keys serialize to an order-preserving byte form (see [`Self::to_bytes`])
/// so coordination-store values and byte-sorted indexes agree with the
/// semantic ordering.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    millis: u64,
    hash: String,
}

impl ContentKey {
    /// Create a key from a unix-epoch millisecond timestamp and a
    /// tie-breaking discriminator.
    pub fn new(millis: u64, hash: impl Into<String>) -> Self {
        Self {
            millis,
            hash: hash.into(),
        }
    }

    /// The smallest possible key; useful as a watermark starting value.
    pub fn zero() -> Self {
        Self {
            millis: 0,
            hash: String::new(),
        }
    }

    /// Millisecond timestamp component.
    pub fn millis(&self) -> u64 {
        self.millis
    }

    /// Discriminator component.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Canonical byte encoding: 8 bytes of big-endian millis followed by
    /// the UTF-8 bytes of the discriminator.
    ///
    /// Byte-lexicographic comparison of two encodings agrees with the
    /// semantic [`Ord`]: the fixed-width big-endian prefix sorts
    /// numerically, and `str` ordering is already byte-wise.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + self.hash.len());
        bytes.extend_from_slice(&self.millis.to_be_bytes());
        bytes.extend_from_slice(self.hash.as_bytes());
        bytes
    }

    /// Decode a key from its canonical byte encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyParseError> {
        if bytes.len() < 8 {
            return Err(KeyParseError::TooShort(bytes.len()));
        }
        let millis = u64::from_be_bytes(bytes[..8].try_into().expect("8 bytes"));
        let hash = std::str::from_utf8(&bytes[8..])
            .map_err(|_| KeyParseError::InvalidDiscriminator)?
            .to_string();
        Ok(Self { millis, hash })
    }
}

impl Default for ContentKey {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.millis, self.hash)
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({self})")
    }
}

/// Failure to decode a [`ContentKey`] from bytes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyParseError {
    /// Fewer than the 8 bytes of the timestamp prefix.
    #[error("content key too short: {0} bytes")]
    TooShort(usize),

    /// The discriminator suffix is not valid UTF-8.
    #[error("content key discriminator is not valid utf-8")]
    InvalidDiscriminator,
}

/// A content key qualified by the channel that holds it.
///
/// Ordering is primarily by [`ContentKey`], secondarily by channel name —
/// the global merge order across channels sharing a tag. The derived `Ord`
/// provides this through field order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelContentKey {
    /// The content key within the channel.
    pub key: ContentKey,
    /// The channel holding the item.
    pub channel: String,
}

impl ChannelContentKey {
    /// Pair a key with its channel.
    pub fn new(channel: impl Into<String>, key: ContentKey) -> Self {
        Self {
            key,
            channel: channel.into(),
        }
    }
}

impl fmt::Display for ChannelContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.key)
    }
}
