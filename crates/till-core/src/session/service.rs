//! Session lifecycle management.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use super::cash::{CashDirection, CashMovement};
use super::model::{DeviceProfile, Session};
use super::repository::{CashMovementLog, SessionRepository};
use crate::error::{Result, TillError};
use crate::money::MinorUnits;
use crate::sale::PaymentMethod;

/// Manages the session lifecycle: `none → opened → closed` (terminal).
///
/// `SessionService` is the single writer for the active session record and
/// the cash movement log. It is constructor-injected with its repositories
/// (no process-wide singletons) so tests and multi-register hosting can
/// scope one service per application instance.
pub struct SessionService {
    /// Persistent storage backend for session history and the active slot
    sessions: Arc<dyn SessionRepository>,
    /// Append-only cash drawer movement log
    movements: Arc<dyn CashMovementLog>,
    /// Serializes open/close transitions so two racing opens cannot both
    /// pass the "no session currently opened" check
    transition: Mutex<()>,
}

impl SessionService {
    /// Creates a new `SessionService` with repository backends.
    pub fn new(sessions: Arc<dyn SessionRepository>, movements: Arc<dyn CashMovementLog>) -> Self {
        Self {
            sessions,
            movements,
            transition: Mutex::new(()),
        }
    }

    /// Opens a new session and makes it the single active one.
    ///
    /// The check-and-persist runs under the transition lock, so concurrent
    /// callers serialize and at most one session can be `Opened` at a time.
    ///
    /// # Errors
    ///
    /// Returns a `Precondition` error if a session is already open.
    pub async fn open_session(
        &self,
        name: impl Into<String>,
        cashier_id: impl Into<String>,
        opening_balance_minor: MinorUnits,
        device: DeviceProfile,
    ) -> Result<Session> {
        let _guard = self.transition.lock().await;

        if let Some(current) = self.sessions.current().await? {
            if current.is_open() {
                return Err(TillError::precondition(format!(
                    "session '{}' is already open",
                    current.id
                )));
            }
        }

        let session = Session::open(name, cashier_id, opening_balance_minor, device);
        self.sessions.save(&session).await?;
        self.sessions.set_current(&session).await?;

        Ok(session)
    }

    /// Closes the active session, recording the counted closing balance.
    ///
    /// The session flips to its terminal `Closed` state, leaves the active
    /// slot, and remains permanently in history.
    ///
    /// # Errors
    ///
    /// Returns a `Precondition` error if no session is open.
    pub async fn close_session(&self, closing_balance_minor: MinorUnits) -> Result<Session> {
        let _guard = self.transition.lock().await;

        let mut session = self.require_open().await?;
        session.close(closing_balance_minor);

        self.sessions.save(&session).await?;
        self.sessions.clear_current().await?;

        Ok(session)
    }

    /// Records a manual cash drawer movement for the active session.
    ///
    /// Movements affect the drawer balance only through the log; the
    /// session's `total_cash_minor` aggregate tracks cash payments
    /// exclusively, so the derived balance never double-counts.
    ///
    /// # Errors
    ///
    /// Returns a `Precondition` error if no session is open or the amount
    /// is negative.
    pub async fn record_cash_movement(
        &self,
        direction: CashDirection,
        amount_minor: MinorUnits,
        reason: impl Into<String>,
    ) -> Result<CashMovement> {
        if amount_minor < 0 {
            return Err(TillError::precondition(
                "cash movement amount must be non-negative",
            ));
        }

        let session = self.require_open().await?;
        let movement = CashMovement::new(session.id, direction, amount_minor, reason);
        self.movements.append(&movement).await?;

        Ok(movement)
    }

    /// Applies a completed payment to the active session's aggregates
    /// and persists the updated record.
    ///
    /// # Errors
    ///
    /// Returns a `Precondition` error if no session is open.
    pub async fn record_sale_payment(
        &self,
        total_minor: MinorUnits,
        method: PaymentMethod,
    ) -> Result<Session> {
        let mut session = self.require_open().await?;
        session.apply_sale_payment(total_minor, method);

        self.sessions.save(&session).await?;
        self.sessions.set_current(&session).await?;

        Ok(session)
    }

    /// Computes the current drawer balance. This is a derived read:
    /// `opening + cash payments + Σ(today's movements, in − out)`.
    ///
    /// Callers must recompute on demand rather than caching the result.
    pub async fn cash_balance_minor(&self) -> Result<MinorUnits> {
        let session = self.require_open().await?;

        let today = Utc::now().date_naive();
        let adjustments: MinorUnits = self
            .movements
            .list_recorded_on(today)
            .await?
            .iter()
            .filter(|m| m.session_id == session.id)
            .map(CashMovement::signed_minor)
            .sum();

        Ok(session.opening_balance_minor + session.total_cash_minor + adjustments)
    }

    /// Returns the currently active session, if any.
    pub async fn current_session(&self) -> Result<Option<Session>> {
        self.sessions.current().await
    }

    /// Lists all sessions in history, including the open one.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.sessions.list_all().await
    }

    /// Returns the active session or a `Precondition` error.
    async fn require_open(&self) -> Result<Session> {
        match self.sessions.current().await? {
            Some(session) if session.is_open() => Ok(session),
            _ => Err(TillError::precondition("no session is currently open")),
        }
    }
}
