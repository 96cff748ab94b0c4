//! Session domain model.
//!
//! This module contains the core `Session` entity that represents one
//! bounded period of register operation in the domain layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::MinorUnits;
use crate::sale::PaymentMethod;

/// Lifecycle status of a session.
///
/// Transitions are `Draft → Opened → Closed`; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Draft,
    Opened,
    Closed,
}

/// Snapshot of the register device configuration taken when the session opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Device display name (e.g. "Front Counter 1")
    pub name: String,
    /// Whether drawer cash control is enforced on this device
    pub cash_control: bool,
    /// Whether a receipt printer is attached
    pub receipt_printer: bool,
    /// Whether a barcode scanner is attached
    pub barcode_scanner: bool,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            name: "Register".to_string(),
            cash_control: true,
            receipt_printer: false,
            barcode_scanner: false,
        }
    }
}

/// Represents one point-of-sale session in the domain layer.
///
/// A session owns the cash drawer accounting between open and close:
/// the opening float, running sale aggregates, and the closing balance.
/// Aggregates are mutated by every completed payment; manual drawer
/// adjustments live in the append-only cash movement log instead.
///
/// Invariant: at most one session has status `Opened` at any time.
/// Once `Closed`, a session is immutable and remains in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Human-readable session name
    pub name: String,
    /// When the session was opened
    pub opened_at: DateTime<Utc>,
    /// When the session was closed; `None` while open
    pub closed_at: Option<DateTime<Utc>>,
    /// Current lifecycle status
    pub status: SessionStatus,
    /// Counted cash float at open, in minor units
    pub opening_balance_minor: MinorUnits,
    /// Counted cash at close, in minor units; `None` while open
    pub closing_balance_minor: Option<MinorUnits>,
    /// Total of all sales in this session
    pub total_sales_minor: MinorUnits,
    /// Total of cash payments (manual drawer movements are not included)
    pub total_cash_minor: MinorUnits,
    /// Total of card payments
    pub total_card_minor: MinorUnits,
    /// Number of completed payments
    pub total_transactions: u64,
    /// Identifier of the cashier who opened the session
    pub cashier_id: String,
    /// Device configuration snapshot
    pub device: DeviceProfile,
}

impl Session {
    /// Creates a new session in `Opened` state with zeroed aggregates.
    pub fn open(
        name: impl Into<String>,
        cashier_id: impl Into<String>,
        opening_balance_minor: MinorUnits,
        device: DeviceProfile,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            opened_at: Utc::now(),
            closed_at: None,
            status: SessionStatus::Opened,
            opening_balance_minor,
            closing_balance_minor: None,
            total_sales_minor: 0,
            total_cash_minor: 0,
            total_card_minor: 0,
            total_transactions: 0,
            cashier_id: cashier_id.into(),
            device,
        }
    }

    /// Returns true while the session is accepting operations.
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Opened
    }

    /// Applies a completed payment to the running aggregates.
    ///
    /// Exactly one of the cash/card totals is incremented, chosen by the
    /// payment method.
    pub fn apply_sale_payment(&mut self, total_minor: MinorUnits, method: PaymentMethod) {
        self.total_sales_minor += total_minor;
        self.total_transactions += 1;
        match method {
            PaymentMethod::Cash => self.total_cash_minor += total_minor,
            PaymentMethod::Card => self.total_card_minor += total_minor,
        }
    }

    /// Transitions the session to its terminal `Closed` state.
    pub fn close(&mut self, closing_balance_minor: MinorUnits) {
        self.status = SessionStatus::Closed;
        self.closed_at = Some(Utc::now());
        self.closing_balance_minor = Some(closing_balance_minor);
    }
}
