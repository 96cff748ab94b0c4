//! The shared key/value state store.
//!
//! Both register windows communicate only through this medium, which mirrors
//! browser local storage: JSON string values under flat logical keys. The
//! store offers at-least-once, unordered, last-write-wins semantics — a
//! reader is only guaranteed to eventually observe the latest write.
//!
//! The transactional primitive is [`WriteBatch`] + [`StateStore::commit`]:
//! all sets and removes in a batch apply in one step, which is what makes
//! the checkout sequence atomic.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use till_core::error::{Result, TillError};

/// Logical key layout of the persisted state.
pub mod keys {
    /// Ordered list of all session records (history, including the open one).
    pub const SESSIONS: &str = "sessions";
    /// The single active session record; absent when none is open.
    pub const CURRENT_SESSION: &str = "current-session";
    /// Append-only list of cash movement records.
    pub const CASH_MOVEMENTS: &str = "cash-movements";
    /// Shared append-only ledger of completed sales.
    pub const COMPLETED_SALES: &str = "completed-sales";

    /// Prefix of the per-session live hash mapping keys.
    pub const SESSION_HASH_PREFIX: &str = "session-hash-";
    /// Prefix of the per-hash display detail keys.
    pub const SESSION_DETAILS_PREFIX: &str = "session-details-";
    /// Prefix of the per-hash live snapshot keys.
    pub const SNAPSHOT_PREFIX: &str = "session-";

    /// Key holding the live hash token for an open session.
    pub fn session_hash(session_id: &str) -> String {
        format!("{SESSION_HASH_PREFIX}{session_id}")
    }

    /// Key holding `{id, name}` for display enumeration.
    pub fn session_details(hash: &str) -> String {
        format!("{SESSION_DETAILS_PREFIX}{hash}")
    }

    /// Key holding the live cart snapshot consumed by the display.
    pub fn snapshot(hash: &str) -> String {
        format!("{SNAPSHOT_PREFIX}{hash}")
    }
}

/// A single operation within a write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Set `key` to the given JSON string value.
    Put { key: String, value: String },
    /// Remove `key` if present.
    Remove { key: String },
}

/// An ordered set of writes applied atomically by [`StateStore::commit`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a raw string value under `key`.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.ops.push(WriteOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Serializes `value` to JSON and stages it under `key`.
    pub fn put_json<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.put(key, json);
        Ok(())
    }

    /// Stages a removal of `key`.
    pub fn remove(&mut self, key: impl Into<String>) {
        self.ops.push(WriteOp::Remove { key: key.into() });
    }

    /// The staged operations, in order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Returns true when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Abstract shared key/value store over JSON string values.
///
/// Implementations must apply a committed batch in one step: either every
/// operation of the batch is visible to subsequent reads or none is.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads the raw value under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Lists all present keys, sorted.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Applies all operations of the batch atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Sets a single raw value (one-op batch).
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put(key, value);
        self.commit(batch).await
    }

    /// Removes a single key (one-op batch).
    async fn remove(&self, key: &str) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.remove(key);
        self.commit(batch).await
    }
}

/// Reads and deserializes the JSON value under `key`.
///
/// A missing key is `Ok(None)`; a present but unparsable value is a
/// `Corrupted` error naming the key.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| TillError::corrupted(key, e.to_string())),
    }
}

/// Serializes `value` and writes it under `key` in a one-op batch.
pub async fn write_json<T: Serialize>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let mut batch = WriteBatch::new();
    batch.put_json(key, value)?;
    store.commit(batch).await
}
