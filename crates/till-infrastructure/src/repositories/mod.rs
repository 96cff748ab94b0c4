//! Store-backed implementations of the core repository traits.

mod cash;
mod sales;
mod session;

pub use cash::StoreCashMovementLog;
pub use sales::StoreSaleLedger;
pub use session::StoreSessionRepository;
