//! Completed-sale domain module.
//!
//! - `model`: Ledger record types (`CompletedSale`, `SaleLine`, `PaymentMethod`)
//! - `repository`: The shared append-only ledger trait (`SaleLedger`)

mod model;
mod repository;

pub use model::{CompletedSale, PaymentMethod, SaleLine, SaleStatus, WALK_IN_CUSTOMER};
pub use repository::SaleLedger;
