//! Application layer: checkout orchestration and the register facade.

pub mod checkout;
pub mod register;

pub use checkout::CheckoutService;
pub use register::Register;
