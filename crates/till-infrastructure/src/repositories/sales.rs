//! Completed-sale ledger over the shared state store.

use std::sync::Arc;

use async_trait::async_trait;

use till_core::error::Result;
use till_core::sale::{CompletedSale, SaleLedger};

use crate::storage::{StateStore, WriteBatch, keys, read_json, write_json};

/// Shared append-only ledger persisted under `completed-sales`, read by the
/// separate sales reporting module.
#[derive(Clone)]
pub struct StoreSaleLedger {
    store: Arc<dyn StateStore>,
}

impl StoreSaleLedger {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Stages a ledger append onto `batch` without committing.
    /// Used by the checkout transaction.
    pub async fn stage_append(&self, batch: &mut WriteBatch, sale: &CompletedSale) -> Result<()> {
        let mut sales = self.load().await?;
        sales.push(sale.clone());
        batch.put_json(keys::COMPLETED_SALES, &sales)
    }

    async fn load(&self) -> Result<Vec<CompletedSale>> {
        Ok(read_json(self.store.as_ref(), keys::COMPLETED_SALES)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl SaleLedger for StoreSaleLedger {
    async fn append(&self, sale: &CompletedSale) -> Result<()> {
        let mut sales = self.load().await?;
        sales.push(sale.clone());
        write_json(self.store.as_ref(), keys::COMPLETED_SALES, &sales).await
    }

    async fn list_all(&self) -> Result<Vec<CompletedSale>> {
        self.load().await
    }
}
