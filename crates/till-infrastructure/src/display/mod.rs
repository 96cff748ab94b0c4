//! Cross-window customer display channel.
//!
//! The register window publishes its live cart under an opaque token; the
//! customer display window (a separate process or task sharing the same
//! state store) subscribes to that token and mirrors the cart. The store is
//! the transport; the [`crate::bus::ChangeBus`] only signals "go re-read".

mod publisher;
mod subscriber;

pub use publisher::DisplayPublisher;
pub use subscriber::{DisplaySubscriber, DisplayView, DisplayWatcher, LiveSession};
