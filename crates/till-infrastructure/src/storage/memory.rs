//! In-memory state store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use till_core::error::Result;

use super::{StateStore, WriteBatch, WriteOp};

/// A mutex-guarded in-memory store.
///
/// Cloning shares the underlying map, so two "windows" constructed from
/// clones of the same store observe each other's writes — the same contract
/// the browser gives two tabs over local storage. Backs tests and
/// same-process dual-window hosting.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        for op in batch.ops() {
            match op {
                WriteOp::Put { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                WriteOp::Remove { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}
