//! Completed-sale ledger records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::Cart;
use crate::money::MinorUnits;

/// Customer placeholder used when no customer was selected at checkout.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
}

/// Lifecycle status of a ledger record. Checkout always writes `Completed`;
/// the other states are set elsewhere in the wider system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
}

/// One sold line item, denormalized into the ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    pub name: String,
    pub price_minor: MinorUnits,
    pub quantity: u32,
}

/// An immutable ledger record created once a payment is finalized.
///
/// The ledger is shared with the sales reporting module; records are never
/// mutated after creation here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSale {
    /// Unique sale identifier (UUID format)
    pub id: String,
    /// Customer display name; defaults to a walk-in placeholder
    pub customer: String,
    /// Paid total in minor units
    pub total_minor: MinorUnits,
    /// Record status
    pub status: SaleStatus,
    /// When the sale completed
    pub date: DateTime<Utc>,
    /// Payment method used
    pub payment_method: PaymentMethod,
    /// Snapshot of the sold line items
    pub lines: Vec<SaleLine>,
    /// Free-text notes
    pub notes: String,
}

impl CompletedSale {
    /// Builds a completed sale from the cart at the moment of payment.
    pub fn from_cart(
        cart: &Cart,
        method: PaymentMethod,
        customer: Option<String>,
        notes: impl Into<String>,
    ) -> Self {
        let lines = cart
            .lines()
            .iter()
            .map(|l| SaleLine {
                product_id: l.product.id.clone(),
                name: l.product.name.clone(),
                price_minor: l.product.price_minor,
                quantity: l.quantity,
            })
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            customer: customer.unwrap_or_else(|| WALK_IN_CUSTOMER.to_string()),
            total_minor: cart.total_minor(),
            status: SaleStatus::Completed,
            date: Utc::now(),
            payment_method: method,
            lines,
            notes: notes.into(),
        }
    }
}
