//! [`CoordStore`] trait and its in-memory and Fjall-backed implementations.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use tokio::sync::Mutex;
use tracing::debug;

use crate::CoordError;

type Result<T> = std::result::Result<T, CoordError>;

/// A value read from the coordination store together with the version the
/// store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    /// The stored bytes.
    pub value: Vec<u8>,
    /// Store-assigned version counter, bumped on every write.
    pub version: u64,
}

/// The narrow interface to a hierarchical coordination store.
///
/// Paths are plain strings; values are opaque bytes. Every write bumps the
/// node's version counter, which [`compare_and_set`](Self::compare_and_set)
/// checks for optimistic concurrency.
#[async_trait]
pub trait CoordStore: Send + Sync {
    /// Create a node, failing with [`CoordError::AlreadyExists`] if it
    /// exists.
    async fn create(&self, path: &str, value: &[u8]) -> Result<()>;

    /// Read a node's value and version, failing with
    /// [`CoordError::NotFound`] if it does not exist.
    async fn read(&self, path: &str) -> Result<Versioned>;

    /// Write a node's value only if its current version matches
    /// `expected_version`; otherwise fail with
    /// [`CoordError::VersionConflict`].
    async fn compare_and_set(&self, path: &str, expected_version: u64, value: &[u8]) -> Result<()>;

    /// Write a node's value unconditionally, creating it if absent.
    async fn put(&self, path: &str, value: &[u8]) -> Result<()>;

    /// Delete a node. Deleting a missing node is a success.
    async fn delete(&self, path: &str) -> Result<()>;

    /// List the paths of all nodes under a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// In-process coordination store for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryCoordStore {
    nodes: Mutex<HashMap<String, Versioned>>,
}

impl MemoryCoordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoordStore for MemoryCoordStore {
    async fn create(&self, path: &str, value: &[u8]) -> Result<()> {
        let mut nodes = self.nodes.lock().await;
        if nodes.contains_key(path) {
            return Err(CoordError::AlreadyExists(path.to_string()));
        }
        nodes.insert(
            path.to_string(),
            Versioned {
                value: value.to_vec(),
                version: 0,
            },
        );
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Versioned> {
        self.nodes
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| CoordError::NotFound(path.to_string()))
    }

    async fn compare_and_set(&self, path: &str, expected_version: u64, value: &[u8]) -> Result<()> {
        let mut nodes = self.nodes.lock().await;
        let node = nodes
            .get_mut(path)
            .ok_or_else(|| CoordError::NotFound(path.to_string()))?;
        if node.version != expected_version {
            return Err(CoordError::VersionConflict {
                path: path.to_string(),
                expected: expected_version,
                actual: node.version,
            });
        }
        node.value = value.to_vec();
        node.version += 1;
        Ok(())
    }

    async fn put(&self, path: &str, value: &[u8]) -> Result<()> {
        let mut nodes = self.nodes.lock().await;
        match nodes.get_mut(path) {
            Some(node) => {
                node.value = value.to_vec();
                node.version += 1;
            }
            None => {
                nodes.insert(
                    path.to_string(),
                    Versioned {
                        value: value.to_vec(),
                        version: 0,
                    },
                );
            }
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.nodes.lock().await.remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let nodes = self.nodes.lock().await;
        let mut paths: Vec<String> = nodes
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }
}

// ---------------------------------------------------------------------------
// Fjall-backed implementation
// ---------------------------------------------------------------------------

/// Persistent coordination store over a local Fjall keyspace.
///
/// Each node is stored as `version (8 bytes big-endian) ++ value`. Fjall
/// has no native conditional write, so every mutation runs under a single
/// async mutex; reads go straight to the keyspace.
pub struct FjallCoordStore {
    /// The underlying Fjall database handle.
    #[allow(dead_code)]
    db: Database,
    /// path → version ++ value.
    nodes: Keyspace,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FjallCoordStore {
    /// Open a persistent store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::builder(path).open()?;
        Self::init_keyspaces(db)
    }

    /// Open a temporary store that is cleaned up on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self> {
        let tmp = tempfile::tempdir().map_err(std::io::Error::other)?;
        let db = Database::builder(tmp.path()).temporary(true).open()?;
        Self::init_keyspaces(db)
    }

    fn init_keyspaces(db: Database) -> Result<Self> {
        let nodes = db.keyspace("nodes", KeyspaceCreateOptions::default)?;
        Ok(Self {
            db,
            nodes,
            write_lock: Mutex::new(()),
        })
    }

    fn decode(path: &str, bytes: &[u8]) -> Result<Versioned> {
        if bytes.len() < 8 {
            return Err(CoordError::Corrupt(path.to_string()));
        }
        let version = u64::from_be_bytes(bytes[..8].try_into().expect("8 bytes"));
        Ok(Versioned {
            value: bytes[8..].to_vec(),
            version,
        })
    }

    fn encode(version: u64, value: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + value.len());
        bytes.extend_from_slice(&version.to_be_bytes());
        bytes.extend_from_slice(value);
        bytes
    }
}

#[async_trait]
impl CoordStore for FjallCoordStore {
    async fn create(&self, path: &str, value: &[u8]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.nodes.get(path.as_bytes())?.is_some() {
            return Err(CoordError::AlreadyExists(path.to_string()));
        }
        self.nodes
            .insert(path.as_bytes(), Self::encode(0, value).as_slice())?;
        debug!(path, "created coordination node");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Versioned> {
        match self.nodes.get(path.as_bytes())? {
            Some(bytes) => Self::decode(path, &bytes),
            None => Err(CoordError::NotFound(path.to_string())),
        }
    }

    async fn compare_and_set(&self, path: &str, expected_version: u64, value: &[u8]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let current = match self.nodes.get(path.as_bytes())? {
            Some(bytes) => Self::decode(path, &bytes)?,
            None => return Err(CoordError::NotFound(path.to_string())),
        };
        if current.version != expected_version {
            return Err(CoordError::VersionConflict {
                path: path.to_string(),
                expected: expected_version,
                actual: current.version,
            });
        }
        self.nodes.insert(
            path.as_bytes(),
            Self::encode(current.version + 1, value).as_slice(),
        )?;
        Ok(())
    }

    async fn put(&self, path: &str, value: &[u8]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let next_version = match self.nodes.get(path.as_bytes())? {
            Some(bytes) => Self::decode(path, &bytes)?.version + 1,
            None => 0,
        };
        self.nodes
            .insert(path.as_bytes(), Self::encode(next_version, value).as_slice())?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.nodes.remove(path.as_bytes())?;
        debug!(path, "deleted coordination node");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for guard in self.nodes.prefix(prefix.as_bytes()) {
            let key = guard.key()?;
            if let Ok(path) = std::str::from_utf8(&key) {
                paths.push(path.to_string());
            }
        }
        Ok(paths)
    }
}
