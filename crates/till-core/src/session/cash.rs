//! Cash drawer movement types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::MinorUnits;

/// Direction of a manual cash drawer adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashDirection {
    In,
    Out,
}

/// A manual adjustment to the cash drawer unrelated to a sale
/// (deposit or withdrawal).
///
/// Movements form an append-only log; a recorded movement is never edited
/// or deleted. The drawer balance derives from this log plus the session's
/// cash-payment aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashMovement {
    /// Unique movement identifier (UUID format)
    pub id: String,
    /// Session this movement belongs to
    pub session_id: String,
    /// Deposit or withdrawal
    pub direction: CashDirection,
    /// Non-negative amount in minor units
    pub amount_minor: MinorUnits,
    /// Free-text reason entered by the cashier
    pub reason: String,
    /// When the movement was recorded
    pub recorded_at: DateTime<Utc>,
}

impl CashMovement {
    /// Creates a new movement stamped with the current time.
    pub fn new(
        session_id: impl Into<String>,
        direction: CashDirection,
        amount_minor: MinorUnits,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            direction,
            amount_minor,
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }

    /// The movement's effect on the drawer: positive for `In`, negative for `Out`.
    pub fn signed_minor(&self) -> MinorUnits {
        match self.direction {
            CashDirection::In => self.amount_minor,
            CashDirection::Out => -self.amount_minor,
        }
    }
}
