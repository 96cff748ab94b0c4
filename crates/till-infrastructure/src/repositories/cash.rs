//! Cash movement log over the shared state store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use till_core::error::Result;
use till_core::session::{CashMovement, CashMovementLog};

use crate::storage::{StateStore, keys, read_json, write_json};

/// Append-only movement log persisted under `cash-movements`.
#[derive(Clone)]
pub struct StoreCashMovementLog {
    store: Arc<dyn StateStore>,
}

impl StoreCashMovementLog {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    async fn load(&self) -> Result<Vec<CashMovement>> {
        Ok(read_json(self.store.as_ref(), keys::CASH_MOVEMENTS)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl CashMovementLog for StoreCashMovementLog {
    async fn append(&self, movement: &CashMovement) -> Result<()> {
        let mut movements = self.load().await?;
        movements.push(movement.clone());
        write_json(self.store.as_ref(), keys::CASH_MOVEMENTS, &movements).await
    }

    async fn list_for_session(&self, session_id: &str) -> Result<Vec<CashMovement>> {
        let movements = self.load().await?;
        Ok(movements
            .into_iter()
            .filter(|m| m.session_id == session_id)
            .collect())
    }

    async fn list_recorded_on(&self, date: NaiveDate) -> Result<Vec<CashMovement>> {
        let movements = self.load().await?;
        Ok(movements
            .into_iter()
            .filter(|m| m.recorded_at.date_naive() == date)
            .collect())
    }
}
