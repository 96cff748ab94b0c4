//! Subscriber side of the display channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::{Interval, MissedTickBehavior, interval};

use till_core::display::{CartSnapshot, DisplayMessage, SessionDetails};
use till_core::error::Result;

use crate::bus::ChangeBus;
use crate::storage::{StateStore, keys};

/// How often a watcher reconciles against the store regardless of bus
/// traffic. The bus is the primary signal; this is the liveness backstop
/// for missed notifications.
pub const RECONCILE_INTERVAL: Duration = Duration::from_secs(5);

/// What the customer display renders for a given hash.
///
/// The three non-live states are deliberately distinct: a missing snapshot
/// ("session ended") must never be confused with a valid empty cart, and a
/// present-but-unparsable snapshot is its own error state rather than a
/// crash.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayView {
    /// The session is live; render the snapshot.
    Live(CartSnapshot),
    /// No snapshot exists under this hash: the session has ended (or the
    /// hash never resolved). The viewer should invite re-selection.
    SessionEnded,
    /// The snapshot exists but cannot be parsed (foreign or damaged data).
    Corrupted { detail: String },
}

/// A discoverable live session: the hash to watch plus its display details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSession {
    pub hash: String,
    pub details: SessionDetails,
}

/// Discovers live sessions and reads cart snapshots from the shared store.
#[derive(Clone)]
pub struct DisplaySubscriber {
    store: Arc<dyn StateStore>,
    bus: ChangeBus,
    poll_interval: Duration,
}

impl DisplaySubscriber {
    pub fn new(store: Arc<dyn StateStore>, bus: ChangeBus) -> Self {
        Self {
            store,
            bus,
            poll_interval: RECONCILE_INTERVAL,
        }
    }

    /// Overrides the reconciliation interval (tests, embedded hosts).
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Enumerates all currently live sessions by scanning the details keys.
    ///
    /// Used by the selection screen when no hash was supplied. Unparsable
    /// entries are skipped with a warning rather than failing the scan.
    pub async fn live_sessions(&self) -> Result<Vec<LiveSession>> {
        let mut sessions = Vec::new();

        for key in self.store.keys().await? {
            let Some(hash) = key.strip_prefix(keys::SESSION_DETAILS_PREFIX) else {
                continue;
            };
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<SessionDetails>(&raw) {
                Ok(details) => sessions.push(LiveSession {
                    hash: hash.to_string(),
                    details,
                }),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "skipping unparsable session details");
                }
            }
        }

        Ok(sessions)
    }

    /// Reads the current view for a hash.
    pub async fn read(&self, hash: &str) -> Result<DisplayView> {
        let key = keys::snapshot(hash);

        let Some(raw) = self.store.get(&key).await? else {
            return Ok(DisplayView::SessionEnded);
        };

        match serde_json::from_str::<CartSnapshot>(&raw) {
            Ok(snapshot) => Ok(DisplayView::Live(snapshot)),
            Err(e) => {
                tracing::warn!(%key, error = %e, "snapshot data corrupted");
                Ok(DisplayView::Corrupted {
                    detail: e.to_string(),
                })
            }
        }
    }

    /// Starts watching a hash: bus-driven re-reads with the periodic
    /// reconciliation poll as backstop.
    pub fn watch(&self, hash: impl Into<String>) -> DisplayWatcher {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        DisplayWatcher {
            store: self.store.clone(),
            rx: self.bus.subscribe(),
            ticker,
            hash: hash.into(),
            bus_closed: false,
            last_updated: None,
        }
    }
}

/// A live view over one hash.
///
/// Each call to [`DisplayWatcher::next`] waits for the next wakeup — a bus
/// message scoped to the hash (or a wildcard), or the reconciliation tick —
/// then re-reads the store and returns the fresh view. The first call
/// returns immediately (the interval fires at once), so a newly attached
/// display renders without waiting.
pub struct DisplayWatcher {
    store: Arc<dyn StateStore>,
    rx: broadcast::Receiver<DisplayMessage>,
    ticker: Interval,
    hash: String,
    bus_closed: bool,
    last_updated: Option<DateTime<Utc>>,
}

impl DisplayWatcher {
    /// Waits for the next wakeup and returns the freshly read view.
    pub async fn next(&mut self) -> Result<DisplayView> {
        loop {
            tokio::select! {
                msg = self.rx.recv(), if !self.bus_closed => {
                    match msg {
                        Ok(m) if m.hash().is_none_or(|h| h == self.hash) => {}
                        Ok(_) => continue,
                        // Lag means we missed messages; the re-read below
                        // reconciles to the latest state anyway
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => {
                            self.bus_closed = true;
                            continue;
                        }
                    }
                }
                _ = self.ticker.tick() => {}
            }

            let view = self.read_current().await?;
            self.last_updated = Some(Utc::now());
            return Ok(view);
        }
    }

    /// When the watcher last re-read the store, if it has yet.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// The hash this watcher is scoped to.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    async fn read_current(&self) -> Result<DisplayView> {
        let key = keys::snapshot(&self.hash);

        let Some(raw) = self.store.get(&key).await? else {
            return Ok(DisplayView::SessionEnded);
        };

        match serde_json::from_str::<CartSnapshot>(&raw) {
            Ok(snapshot) => Ok(DisplayView::Live(snapshot)),
            Err(e) => Ok(DisplayView::Corrupted {
                detail: e.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for DisplayWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayWatcher")
            .field("hash", &self.hash)
            .field("last_updated", &self.last_updated)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayPublisher;
    use crate::storage::MemoryStore;
    use till_core::cart::{Cart, Product};
    use till_core::session::{DeviceProfile, Session};

    fn product() -> Product {
        Product {
            id: "P004".to_string(),
            name: "Monitor".to_string(),
            price_minor: 59_999,
            category: "Displays".to_string(),
        }
    }

    fn setup() -> (Arc<MemoryStore>, ChangeBus, DisplayPublisher, DisplaySubscriber) {
        let store = Arc::new(MemoryStore::new());
        let bus = ChangeBus::new();
        let publisher = DisplayPublisher::new(store.clone(), bus.clone());
        let subscriber = DisplaySubscriber::new(store.clone(), bus.clone());
        (store, bus, publisher, subscriber)
    }

    #[tokio::test]
    async fn test_unknown_hash_reads_session_ended() {
        let (_store, _bus, _publisher, subscriber) = setup();

        let view = subscriber.read("deadbeef").await.unwrap();
        assert_eq!(view, DisplayView::SessionEnded);
    }

    #[tokio::test]
    async fn test_corrupted_snapshot_is_its_own_state() {
        let (store, _bus, _publisher, subscriber) = setup();

        store
            .put(&keys::snapshot("bad"), "not json at all")
            .await
            .unwrap();

        let view = subscriber.read("bad").await.unwrap();
        assert!(matches!(view, DisplayView::Corrupted { .. }));
    }

    #[tokio::test]
    async fn test_live_view_renders_snapshot() {
        let (_store, _bus, publisher, subscriber) = setup();
        let session = Session::open("Shift", "c", 0, DeviceProfile::default());
        let hash = publisher.open_channel(&session).await.unwrap();

        let mut cart = Cart::new();
        cart.add_product(product());
        publisher.publish_cart(&hash, &cart).await.unwrap();

        let view = subscriber.read(&hash).await.unwrap();
        let DisplayView::Live(snapshot) = view else {
            panic!("expected live view, got {view:?}");
        };
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.total_minor(), 59_999);
    }

    #[tokio::test]
    async fn test_live_sessions_discovery() {
        let (_store, _bus, publisher, subscriber) = setup();

        assert!(subscriber.live_sessions().await.unwrap().is_empty());

        let session = Session::open("Morning shift", "c", 0, DeviceProfile::default());
        let hash = publisher.open_channel(&session).await.unwrap();

        let live = subscriber.live_sessions().await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].hash, hash);
        assert_eq!(live[0].details.id, session.id);
        assert_eq!(live[0].details.name, "Morning shift");

        publisher.close_channel(&session.id, &hash).await.unwrap();
        assert!(subscriber.live_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watcher_sees_publish_via_bus() {
        let (_store, _bus, publisher, subscriber) = setup();
        let session = Session::open("Shift", "c", 0, DeviceProfile::default());
        let hash = publisher.open_channel(&session).await.unwrap();

        let mut watcher = subscriber.watch(&hash);

        // First wakeup is immediate: the empty opening snapshot
        let first = watcher.next().await.unwrap();
        assert!(matches!(first, DisplayView::Live(ref s) if s.lines.is_empty()));
        assert!(watcher.last_updated().is_some());

        let mut cart = Cart::new();
        cart.add_product(product());
        publisher.publish_cart(&hash, &cart).await.unwrap();

        let second = watcher.next().await.unwrap();
        let DisplayView::Live(snapshot) = second else {
            panic!("expected live view");
        };
        assert_eq!(snapshot.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_watcher_transitions_to_ended_on_close() {
        let (_store, _bus, publisher, subscriber) = setup();
        let session = Session::open("Shift", "c", 0, DeviceProfile::default());
        let hash = publisher.open_channel(&session).await.unwrap();

        let mut watcher = subscriber.watch(&hash);
        watcher.next().await.unwrap(); // initial live view

        publisher.close_channel(&session.id, &hash).await.unwrap();

        let view = watcher.next().await.unwrap();
        assert_eq!(view, DisplayView::SessionEnded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_poll_backstop_without_bus_traffic() {
        let (store, bus, _publisher, _ignored) = setup();
        let subscriber =
            DisplaySubscriber::new(store.clone(), bus).with_poll_interval(Duration::from_secs(5));

        let mut watcher = subscriber.watch("h1");
        assert_eq!(watcher.next().await.unwrap(), DisplayView::SessionEnded);

        // Write directly to the store, bypassing the bus entirely
        let snapshot = CartSnapshot::empty("h1");
        store
            .put(
                &keys::snapshot("h1"),
                &serde_json::to_string(&snapshot).unwrap(),
            )
            .await
            .unwrap();

        // The periodic reconciliation poll picks it up within one interval
        let view = watcher.next().await.unwrap();
        assert!(matches!(view, DisplayView::Live(_)));
    }

    #[tokio::test]
    async fn test_watcher_ignores_other_hashes() {
        let (_store, bus, publisher, subscriber) = setup();
        let session = Session::open("Shift", "c", 0, DeviceProfile::default());
        let hash = publisher.open_channel(&session).await.unwrap();

        let mut watcher = subscriber.watch(&hash);
        watcher.next().await.unwrap();

        // A message scoped to a different hash must not produce a wakeup,
        // but a wildcard must
        bus.publish(DisplayMessage::SnapshotWritten {
            hash: "someone-else".to_string(),
        });
        bus.publish(DisplayMessage::LedgerAppended);

        let view = watcher.next().await.unwrap();
        assert!(matches!(view, DisplayView::Live(_)));
    }
}
