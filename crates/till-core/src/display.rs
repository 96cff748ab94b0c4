//! Customer-display channel types.
//!
//! A second viewing surface locates a session's live cart through an opaque
//! token (the "hash") published alongside the session. The types here define
//! the published projection and the explicit broadcast message schema used
//! instead of overloading a generic storage-change signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine};
use crate::money::MinorUnits;

/// The serialized cart projection published under a session's hash.
///
/// This is a derived, disposable view of the in-memory cart, never a source
/// of truth; it may be dropped and regenerated at will.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// The display token this snapshot belongs to
    pub hash: String,
    /// Current cart lines
    pub lines: Vec<CartLine>,
    /// When the snapshot was written
    pub written_at: DateTime<Utc>,
}

impl CartSnapshot {
    /// Projects the given cart under a hash, stamped with the current time.
    pub fn of_cart(hash: impl Into<String>, cart: &Cart) -> Self {
        Self {
            hash: hash.into(),
            lines: cart.lines().to_vec(),
            written_at: Utc::now(),
        }
    }

    /// An explicitly emptied snapshot, written on checkout so the viewer
    /// renders the empty state instead of freezing on the last cart.
    pub fn empty(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            lines: Vec::new(),
            written_at: Utc::now(),
        }
    }

    /// Total of the snapshot lines in minor units.
    pub fn total_minor(&self) -> MinorUnits {
        self.lines.iter().map(CartLine::total_minor).sum()
    }
}

/// Display details published so a viewer can enumerate live sessions
/// without knowing a hash in advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDetails {
    /// Session identifier
    pub id: String,
    /// Session display name
    pub name: String,
}

/// Messages broadcast on the change bus.
///
/// Every write announces itself with one of these, so same-process viewers
/// stay in sync without native cross-window storage events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayMessage {
    /// A snapshot was (re)written under the given hash.
    SnapshotWritten { hash: String },
    /// The session behind the given hash closed and its keys were removed.
    ChannelClosed { hash: String },
    /// A completed sale was appended to the shared ledger.
    LedgerAppended,
}

impl DisplayMessage {
    /// The hash this message is scoped to, if any.
    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::SnapshotWritten { hash } | Self::ChannelClosed { hash } => Some(hash),
            Self::LedgerAppended => None,
        }
    }
}
