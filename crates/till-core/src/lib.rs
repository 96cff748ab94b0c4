//! Tillsync domain layer.
//!
//! Pure domain models and services for the point-of-sale engine: sessions
//! and their cash drawer accounting, the in-memory cart, the completed-sale
//! ledger, and the customer-display channel types. Persistence and transport
//! live behind the repository traits defined here and are provided by
//! `till-infrastructure`.

pub mod cart;
pub mod display;
pub mod error;
pub mod money;
pub mod sale;
pub mod session;

// Re-export common error type
pub use error::{Result, TillError};
