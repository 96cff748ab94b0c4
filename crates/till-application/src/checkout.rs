//! Checkout finalization.
//!
//! Payment completion is the one multi-record write in the system: the
//! session aggregates, the active-session slot, the shared sales ledger,
//! and the cleared display snapshot must all land together. This module
//! stages them onto a single [`WriteBatch`] and commits once, so a crash
//! between steps can never leave a sale in the ledger without its session
//! totals (or vice versa).

use std::sync::Arc;

use till_core::cart::Cart;
use till_core::display::CartSnapshot;
use till_core::error::{Result, TillError};
use till_core::sale::{CompletedSale, PaymentMethod};
use till_core::session::SessionRepository;

use till_infrastructure::display::DisplayPublisher;
use till_infrastructure::repositories::{StoreSaleLedger, StoreSessionRepository};
use till_infrastructure::storage::{StateStore, WriteBatch};

/// Finalizes payments atomically against the shared state store.
pub struct CheckoutService {
    store: Arc<dyn StateStore>,
    sessions: StoreSessionRepository,
    ledger: StoreSaleLedger,
    publisher: DisplayPublisher,
}

impl CheckoutService {
    pub fn new(
        store: Arc<dyn StateStore>,
        sessions: StoreSessionRepository,
        ledger: StoreSaleLedger,
        publisher: DisplayPublisher,
    ) -> Self {
        Self {
            store,
            sessions,
            ledger,
            publisher,
        }
    }

    /// Completes a payment for the cart contents.
    ///
    /// Stages the updated session record, the ledger append, and an emptied
    /// display snapshot onto one batch and commits it in a single call.
    /// Bus announcements go out only after the commit succeeds. Returns the
    /// ledger record; the caller clears its in-memory cart on success.
    ///
    /// # Errors
    ///
    /// Returns a `Precondition` error if no session is open or the cart is
    /// empty.
    pub async fn process_payment(
        &self,
        cart: &Cart,
        method: PaymentMethod,
        customer: Option<String>,
        notes: impl Into<String>,
    ) -> Result<CompletedSale> {
        if cart.is_empty() {
            return Err(TillError::precondition("cannot check out an empty cart"));
        }

        let mut session = match self.sessions.current().await? {
            Some(session) if session.is_open() => session,
            _ => return Err(TillError::precondition("no session is currently open")),
        };

        let sale = CompletedSale::from_cart(cart, method, customer, notes);
        session.apply_sale_payment(sale.total_minor, method);

        let display_hash = self.publisher.hash_for_session(&session.id).await?;

        let mut batch = WriteBatch::new();
        self.sessions.stage_save(&mut batch, &session).await?;
        StoreSessionRepository::stage_current(&mut batch, &session)?;
        self.ledger.stage_append(&mut batch, &sale).await?;
        if let Some(hash) = &display_hash {
            DisplayPublisher::stage_snapshot(&mut batch, &CartSnapshot::empty(hash))?;
        }

        self.store.commit(batch).await?;

        self.publisher.announce_ledger();
        if let Some(hash) = &display_hash {
            self.publisher.announce_snapshot(hash);
        }

        tracing::info!(
            sale_id = %sale.id,
            total_minor = sale.total_minor,
            method = ?sale.payment_method,
            "payment completed"
        );

        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::cart::Product;
    use till_core::sale::{SaleLedger, SaleStatus, WALK_IN_CUSTOMER};
    use till_core::session::{DeviceProfile, Session};
    use till_infrastructure::bus::ChangeBus;
    use till_infrastructure::storage::MemoryStore;

    fn product(price_minor: i64) -> Product {
        Product {
            id: "P004".to_string(),
            name: "Monitor".to_string(),
            price_minor,
            category: "Displays".to_string(),
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        sessions: StoreSessionRepository,
        ledger: StoreSaleLedger,
        publisher: DisplayPublisher,
        checkout: CheckoutService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let bus = ChangeBus::new();
        let sessions = StoreSessionRepository::new(store.clone());
        let ledger = StoreSaleLedger::new(store.clone());
        let publisher = DisplayPublisher::new(store.clone(), bus);
        let checkout = CheckoutService::new(
            store.clone(),
            sessions.clone(),
            ledger.clone(),
            publisher.clone(),
        );
        Fixture {
            store,
            sessions,
            ledger,
            publisher,
            checkout,
        }
    }

    async fn open_session(f: &Fixture) -> Session {
        let session = Session::open("Shift", "c", 50_000, DeviceProfile::default());
        f.sessions.save(&session).await.unwrap();
        f.sessions.set_current(&session).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let f = fixture();
        open_session(&f).await;

        let result = f
            .checkout
            .process_payment(&Cart::new(), PaymentMethod::Cash, None, "")
            .await;
        assert!(matches!(result, Err(TillError::Precondition(_))));
    }

    #[tokio::test]
    async fn test_requires_open_session() {
        let f = fixture();
        let mut cart = Cart::new();
        cart.add_product(product(2999));

        let result = f
            .checkout
            .process_payment(&cart, PaymentMethod::Cash, None, "")
            .await;
        assert!(matches!(result, Err(TillError::Precondition(_))));
        assert!(f.ledger.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_updates_ledger_session_and_display_together() {
        let f = fixture();
        let session = open_session(&f).await;
        let hash = f.publisher.open_channel(&session).await.unwrap();

        let mut cart = Cart::new();
        cart.add_product(product(59_999));
        f.publisher.publish_cart(&hash, &cart).await.unwrap();

        let sale = f
            .checkout
            .process_payment(&cart, PaymentMethod::Cash, None, "")
            .await
            .unwrap();

        assert_eq!(sale.total_minor, 59_999);
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.customer, WALK_IN_CUSTOMER);

        // Ledger has the record
        let all = f.ledger.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, sale.id);

        // Session aggregates updated in both history and the active slot
        let current = f.sessions.current().await.unwrap().unwrap();
        assert_eq!(current.total_sales_minor, 59_999);
        assert_eq!(current.total_cash_minor, 59_999);
        assert_eq!(current.total_transactions, 1);
        let in_history = f
            .sessions
            .find_by_id(&session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(in_history.total_transactions, 1);

        // Display snapshot cleared, not removed
        let raw = f
            .store
            .get(&till_infrastructure::storage::keys::snapshot(&hash))
            .await
            .unwrap()
            .unwrap();
        let snapshot: CartSnapshot = serde_json::from_str(&raw).unwrap();
        assert!(snapshot.lines.is_empty());
    }

    #[tokio::test]
    async fn test_card_payment_lands_in_card_aggregate() {
        let f = fixture();
        open_session(&f).await;

        let mut cart = Cart::new();
        cart.add_product(product(5998));
        f.checkout
            .process_payment(&cart, PaymentMethod::Card, None, "")
            .await
            .unwrap();

        let current = f.sessions.current().await.unwrap().unwrap();
        assert_eq!(current.total_card_minor, 5998);
        assert_eq!(current.total_cash_minor, 0);
    }

    #[tokio::test]
    async fn test_named_customer_is_recorded() {
        let f = fixture();
        open_session(&f).await;

        let mut cart = Cart::new();
        cart.add_product(product(2999));
        let sale = f
            .checkout
            .process_payment(
                &cart,
                PaymentMethod::Card,
                Some("Ada Lovelace".to_string()),
                "loyalty #42",
            )
            .await
            .unwrap();

        assert_eq!(sale.customer, "Ada Lovelace");
        assert_eq!(sale.notes, "loyalty #42");
    }
}
