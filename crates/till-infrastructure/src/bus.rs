//! Change notification bus.
//!
//! A named broadcast channel carrying typed [`DisplayMessage`] values.
//! Every store write that matters to a viewer announces itself here, which
//! covers same-process listeners that would not receive a native cross-tab
//! storage event. Delivery is best effort: lagged receivers miss messages
//! and reconcile by re-reading the store on their next poll.

use tokio::sync::broadcast;

use till_core::display::DisplayMessage;

/// Default channel capacity; lag past this is tolerated by design.
const DEFAULT_CAPACITY: usize = 64;

/// A cloneable handle to the broadcast channel.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<DisplayMessage>,
}

impl ChangeBus {
    /// Creates a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes a message to all current subscribers.
    ///
    /// Publishing never blocks and never fails: with no subscribers the
    /// message is simply dropped, matching fire-and-forget notification
    /// semantics.
    pub fn publish(&self, message: DisplayMessage) {
        tracing::debug!(?message, "bus publish");
        let _ = self.tx.send(message);
    }

    /// Subscribes to messages published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayMessage> {
        self.tx.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
