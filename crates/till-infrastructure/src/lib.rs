//! Infrastructure layer: shared state storage, change bus, repository
//! implementations, display channel plumbing, paths, and configuration.

pub mod bus;
pub mod config;
pub mod display;
pub mod paths;
pub mod repositories;
pub mod storage;

pub use bus::ChangeBus;
pub use config::{ConfigService, RegisterConfig};
pub use display::{DisplayPublisher, DisplaySubscriber, DisplayView, DisplayWatcher, LiveSession};
pub use paths::{PathError, TillPaths};
pub use repositories::{StoreCashMovementLog, StoreSaleLedger, StoreSessionRepository};
pub use storage::{JsonFileStore, MemoryStore, StateStore, WriteBatch, WriteOp};
