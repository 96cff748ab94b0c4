//! Sale ledger trait.

use async_trait::async_trait;

use super::model::CompletedSale;
use crate::error::Result;

/// The shared append-only ledger of completed sales.
///
/// Checkout appends to it; the separate sales reporting module reads it.
/// Records are never mutated through this interface.
#[async_trait]
pub trait SaleLedger: Send + Sync {
    /// Appends a completed sale to the ledger.
    async fn append(&self, sale: &CompletedSale) -> Result<()>;

    /// Lists all ledger records, oldest first.
    async fn list_all(&self) -> Result<Vec<CompletedSale>>;
}
