//! Session domain module.
//!
//! A session is a bounded period of point-of-sale operation with its own
//! cash drawer accounting, from open to close.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `SessionStatus`, `DeviceProfile`)
//! - `cash`: Cash drawer movement types (`CashMovement`, `CashDirection`)
//! - `repository`: Repository traits for session and movement persistence
//! - `service`: Session lifecycle management (`SessionService`)

mod cash;
mod model;
mod repository;
mod service;

pub use cash::{CashDirection, CashMovement};
pub use model::{DeviceProfile, Session, SessionStatus};
pub use repository::{CashMovementLog, SessionRepository};
pub use service::SessionService;
