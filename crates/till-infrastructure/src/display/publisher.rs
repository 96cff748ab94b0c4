//! Publisher side of the display channel.

use std::sync::Arc;

use uuid::Uuid;

use till_core::cart::Cart;
use till_core::display::{CartSnapshot, DisplayMessage, SessionDetails};
use till_core::error::Result;
use till_core::session::Session;

use crate::bus::ChangeBus;
use crate::storage::{StateStore, WriteBatch, keys, read_json};

/// Publishes the live cart of an open session for customer-facing viewers.
///
/// On session open the publisher writes three keys: the session→hash
/// mapping, the hash→details mapping (for discovery), and the initial
/// empty snapshot. Every cart mutation rewrites the snapshot and announces
/// it on the bus. On session close all three keys are removed in one batch.
#[derive(Clone)]
pub struct DisplayPublisher {
    store: Arc<dyn StateStore>,
    bus: ChangeBus,
}

impl DisplayPublisher {
    pub fn new(store: Arc<dyn StateStore>, bus: ChangeBus) -> Self {
        Self { store, bus }
    }

    /// Opens a display channel for the session and returns its hash.
    ///
    /// The hash is a freshly generated 128-bit random token (uuid v4 in
    /// simple form); uniqueness scope is process-wide.
    pub async fn open_channel(&self, session: &Session) -> Result<String> {
        let hash = Uuid::new_v4().simple().to_string();

        let details = SessionDetails {
            id: session.id.clone(),
            name: session.name.clone(),
        };

        let mut batch = WriteBatch::new();
        batch.put_json(keys::session_hash(&session.id), &hash)?;
        batch.put_json(keys::session_details(&hash), &details)?;
        batch.put_json(keys::snapshot(&hash), &CartSnapshot::empty(&hash))?;
        self.store.commit(batch).await?;

        tracing::info!(session_id = %session.id, %hash, "display channel opened");
        self.bus
            .publish(DisplayMessage::SnapshotWritten { hash: hash.clone() });

        Ok(hash)
    }

    /// Publishes the current cart under the given hash.
    pub async fn publish_cart(&self, hash: &str, cart: &Cart) -> Result<()> {
        self.publish_snapshot(CartSnapshot::of_cart(hash, cart)).await
    }

    /// Publishes an explicitly emptied snapshot, so viewers render the
    /// empty state instead of freezing on the last nonempty cart.
    pub async fn publish_empty(&self, hash: &str) -> Result<()> {
        self.publish_snapshot(CartSnapshot::empty(hash)).await
    }

    /// Stages a snapshot write onto `batch` without committing or
    /// announcing. Used by the checkout transaction; the caller publishes
    /// [`DisplayMessage::SnapshotWritten`] after the commit.
    pub fn stage_snapshot(batch: &mut WriteBatch, snapshot: &CartSnapshot) -> Result<()> {
        batch.put_json(keys::snapshot(&snapshot.hash), snapshot)
    }

    /// Removes all channel keys for a closing session and announces the
    /// closure. Viewers of the hash transition to their "session ended"
    /// state.
    pub async fn close_channel(&self, session_id: &str, hash: &str) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.remove(keys::session_hash(session_id));
        batch.remove(keys::session_details(hash));
        batch.remove(keys::snapshot(hash));
        self.store.commit(batch).await?;

        tracing::info!(%session_id, %hash, "display channel closed");
        self.bus.publish(DisplayMessage::ChannelClosed {
            hash: hash.to_string(),
        });

        Ok(())
    }

    /// Looks up the live hash for a session, if one is published.
    pub async fn hash_for_session(&self, session_id: &str) -> Result<Option<String>> {
        read_json(self.store.as_ref(), &keys::session_hash(session_id)).await
    }

    /// Announces the snapshot under `hash` as rewritten. Used after a
    /// batch commit that staged the snapshot itself.
    pub fn announce_snapshot(&self, hash: &str) {
        self.bus.publish(DisplayMessage::SnapshotWritten {
            hash: hash.to_string(),
        });
    }

    /// Announces a ledger append to interested readers.
    pub fn announce_ledger(&self) {
        self.bus.publish(DisplayMessage::LedgerAppended);
    }

    async fn publish_snapshot(&self, snapshot: CartSnapshot) -> Result<()> {
        let hash = snapshot.hash.clone();

        let mut batch = WriteBatch::new();
        Self::stage_snapshot(&mut batch, &snapshot)?;
        self.store.commit(batch).await?;

        self.bus.publish(DisplayMessage::SnapshotWritten { hash });
        Ok(())
    }
}
