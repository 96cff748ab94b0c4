//! Session persistence traits.
//!
//! Defines the interfaces for session and cash movement persistence,
//! decoupling the lifecycle logic from the specific storage mechanism
//! (in-memory store, JSON file store, or anything else).

use async_trait::async_trait;
use chrono::NaiveDate;

use super::cash::CashMovement;
use super::model::Session;
use crate::error::Result;

/// An abstract repository for session history and the active session.
///
/// The history (`list_all`) contains every session ever opened, including
/// the currently open one. The "current" slot holds at most one session
/// record and is cleared when that session closes.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session in history by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Inserts or replaces a session in history, matched by ID.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Lists all sessions in history, oldest first.
    async fn list_all(&self) -> Result<Vec<Session>>;

    /// Returns the currently active session record, if any.
    async fn current(&self) -> Result<Option<Session>>;

    /// Sets the currently active session record.
    async fn set_current(&self, session: &Session) -> Result<()>;

    /// Clears the active session slot.
    async fn clear_current(&self) -> Result<()>;
}

/// Append-only log of manual cash drawer movements.
#[async_trait]
pub trait CashMovementLog: Send + Sync {
    /// Appends a movement to the log.
    async fn append(&self, movement: &CashMovement) -> Result<()>;

    /// Lists all movements recorded for the given session, oldest first.
    async fn list_for_session(&self, session_id: &str) -> Result<Vec<CashMovement>>;

    /// Lists all movements recorded on the given UTC date, oldest first.
    async fn list_recorded_on(&self, date: NaiveDate) -> Result<Vec<CashMovement>>;
}
