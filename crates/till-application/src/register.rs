//! Register window facade.
//!
//! One `Register` per register window. It owns the in-memory cart and the
//! display hash for the open session, and wires the session lifecycle,
//! cart mutations, display publishing, and checkout into a single surface
//! the UI layer calls. All shared state lives in the injected store; two
//! `Register` values over the same store behave like two windows of the
//! same till.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use till_core::cart::{Cart, Product};
use till_core::error::{Result, TillError};
use till_core::money::MinorUnits;
use till_core::sale::{CompletedSale, PaymentMethod};
use till_core::session::{CashDirection, CashMovement, DeviceProfile, Session, SessionService};

use till_infrastructure::bus::ChangeBus;
use till_infrastructure::config::RegisterConfig;
use till_infrastructure::display::{DisplayPublisher, DisplaySubscriber};
use till_infrastructure::repositories::{
    StoreCashMovementLog, StoreSaleLedger, StoreSessionRepository,
};
use till_infrastructure::storage::StateStore;

use crate::checkout::CheckoutService;

/// Window-local state: the cart being rung up and the display hash of the
/// session it belongs to.
#[derive(Default)]
struct WindowState {
    cart: Cart,
    display_hash: Option<String>,
}

/// Facade over one register window.
pub struct Register {
    sessions: SessionService,
    checkout: CheckoutService,
    publisher: DisplayPublisher,
    subscriber: DisplaySubscriber,
    state: Mutex<WindowState>,
}

impl Register {
    /// Wires a register over a shared store and change bus.
    ///
    /// Every service is built here from the two injected collaborators;
    /// nothing reaches for process-wide state.
    pub fn new(store: Arc<dyn StateStore>, bus: ChangeBus) -> Self {
        let session_repo = StoreSessionRepository::new(store.clone());
        let movement_log = StoreCashMovementLog::new(store.clone());
        let ledger = StoreSaleLedger::new(store.clone());
        let publisher = DisplayPublisher::new(store.clone(), bus.clone());
        let subscriber = DisplaySubscriber::new(store.clone(), bus);

        let sessions = SessionService::new(
            Arc::new(session_repo.clone()),
            Arc::new(movement_log),
        );
        let checkout = CheckoutService::new(store, session_repo, ledger, publisher.clone());

        Self {
            sessions,
            checkout,
            publisher,
            subscriber,
            state: Mutex::new(WindowState::default()),
        }
    }

    /// Like [`Register::new`], applying the configured poll interval to the
    /// display subscriber.
    pub fn with_config(
        store: Arc<dyn StateStore>,
        bus: ChangeBus,
        config: &RegisterConfig,
    ) -> Self {
        let mut register = Self::new(store, bus);
        register.subscriber = register
            .subscriber
            .clone()
            .with_poll_interval(Duration::from_secs(config.poll_interval_secs));
        register
    }

    /// Subscriber handle for a customer display attached to this store.
    pub fn subscriber(&self) -> DisplaySubscriber {
        self.subscriber.clone()
    }

    // ---- session lifecycle ----

    /// Opens a session and its display channel. Returns the session.
    pub async fn open_session(
        &self,
        name: impl Into<String>,
        cashier_id: impl Into<String>,
        opening_balance_minor: MinorUnits,
        device: DeviceProfile,
    ) -> Result<Session> {
        let session = self
            .sessions
            .open_session(name, cashier_id, opening_balance_minor, device)
            .await?;
        let hash = self.publisher.open_channel(&session).await?;

        let mut state = self.state.lock().await;
        state.cart = Cart::new();
        state.display_hash = Some(hash);

        Ok(session)
    }

    /// Re-attaches this window to an already open session (a second window
    /// of the same till, or a restart while a session was open).
    pub async fn resume(&self) -> Result<Option<Session>> {
        let Some(session) = self.sessions.current_session().await? else {
            return Ok(None);
        };
        if !session.is_open() {
            return Ok(None);
        }

        let hash = self.publisher.hash_for_session(&session.id).await?;
        self.state.lock().await.display_hash = hash;

        Ok(Some(session))
    }

    /// Closes the open session and tears down its display channel.
    pub async fn close_session(&self, closing_balance_minor: MinorUnits) -> Result<Session> {
        let session = self.sessions.close_session(closing_balance_minor).await?;

        let mut state = self.state.lock().await;
        if let Some(hash) = state.display_hash.take() {
            self.publisher.close_channel(&session.id, &hash).await?;
        }
        state.cart = Cart::new();

        Ok(session)
    }

    /// Returns the currently open session, if any.
    pub async fn current_session(&self) -> Result<Option<Session>> {
        self.sessions.current_session().await
    }

    /// Lists all sessions in history.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.sessions.list_sessions().await
    }

    // ---- cart ----

    /// Adds a product to the cart (or bumps its quantity) and republishes
    /// the display snapshot.
    pub async fn add_product(&self, product: Product) -> Result<Cart> {
        let mut state = self.lock_open().await?;
        state.cart.add_product(product);
        self.publish(&state).await?;
        Ok(state.cart.clone())
    }

    /// Sets the absolute quantity of a cart line; zero removes the line.
    pub async fn set_quantity(&self, product_id: &str, quantity: u32) -> Result<Cart> {
        let mut state = self.lock_open().await?;
        state.cart.set_quantity(product_id, quantity);
        self.publish(&state).await?;
        Ok(state.cart.clone())
    }

    /// Empties the cart and pushes the empty state to the display.
    pub async fn clear_cart(&self) -> Result<()> {
        let mut state = self.lock_open().await?;
        state.cart.clear();
        self.publish(&state).await
    }

    /// Snapshot of the current cart.
    pub async fn cart(&self) -> Cart {
        self.state.lock().await.cart.clone()
    }

    // ---- cash drawer ----

    /// Records money added to the drawer outside a sale (float top-up).
    pub async fn cash_in(
        &self,
        amount_minor: MinorUnits,
        reason: impl Into<String>,
    ) -> Result<CashMovement> {
        self.sessions
            .record_cash_movement(CashDirection::In, amount_minor, reason)
            .await
    }

    /// Records money taken from the drawer outside a sale (payout).
    pub async fn cash_out(
        &self,
        amount_minor: MinorUnits,
        reason: impl Into<String>,
    ) -> Result<CashMovement> {
        self.sessions
            .record_cash_movement(CashDirection::Out, amount_minor, reason)
            .await
    }

    /// Current derived drawer balance.
    pub async fn cash_balance_minor(&self) -> Result<MinorUnits> {
        self.sessions.cash_balance_minor().await
    }

    // ---- checkout ----

    /// Finalizes payment for the cart. On success the in-memory cart is
    /// cleared; the display snapshot was already emptied inside the commit.
    pub async fn checkout(
        &self,
        method: PaymentMethod,
        customer: Option<String>,
        notes: impl Into<String>,
    ) -> Result<CompletedSale> {
        let mut state = self.state.lock().await;

        let sale = self
            .checkout
            .process_payment(&state.cart, method, customer, notes)
            .await?;

        state.cart = Cart::new();
        Ok(sale)
    }

    // ---- internals ----

    /// Locks window state and verifies a session is attached.
    async fn lock_open(&self) -> Result<tokio::sync::MutexGuard<'_, WindowState>> {
        let state = self.state.lock().await;
        if state.display_hash.is_none() {
            return Err(TillError::precondition("no session is currently open"));
        }
        Ok(state)
    }

    async fn publish(&self, state: &WindowState) -> Result<()> {
        match &state.display_hash {
            Some(hash) => self.publisher.publish_cart(hash, &state.cart).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use till_infrastructure::storage::MemoryStore;

    fn product(id: &str, price_minor: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            price_minor,
            category: "Test".to_string(),
        }
    }

    fn register() -> Register {
        Register::new(Arc::new(MemoryStore::new()), ChangeBus::new())
    }

    #[tokio::test]
    async fn test_cart_requires_open_session() {
        let register = register();

        let result = register.add_product(product("P001", 2999)).await;
        assert!(matches!(result, Err(TillError::Precondition(_))));
    }

    #[tokio::test]
    async fn test_open_ring_up_and_checkout() {
        let register = register();
        register
            .open_session("Shift", "c", 50_000, DeviceProfile::default())
            .await
            .unwrap();

        register.add_product(product("P001", 2999)).await.unwrap();
        register.add_product(product("P001", 2999)).await.unwrap();
        let cart = register.add_product(product("P002", 1500)).await.unwrap();
        assert_eq!(cart.total_minor(), 7498);

        let sale = register
            .checkout(PaymentMethod::Cash, None, "")
            .await
            .unwrap();
        assert_eq!(sale.total_minor, 7498);

        // Cart resets after payment
        assert!(register.cart().await.is_empty());
        assert_eq!(register.cash_balance_minor().await.unwrap(), 57_498);
    }

    #[tokio::test]
    async fn test_set_quantity_and_clear() {
        let register = register();
        register
            .open_session("Shift", "c", 0, DeviceProfile::default())
            .await
            .unwrap();

        register.add_product(product("P001", 1000)).await.unwrap();
        let cart = register.set_quantity("P001", 3).await.unwrap();
        assert_eq!(cart.total_minor(), 3000);

        let cart = register.set_quantity("P001", 0).await.unwrap();
        assert!(cart.is_empty());

        register.add_product(product("P002", 500)).await.unwrap();
        register.clear_cart().await.unwrap();
        assert!(register.cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_close_clears_window_state() {
        let register = register();
        let session = register
            .open_session("Shift", "c", 0, DeviceProfile::default())
            .await
            .unwrap();
        register.add_product(product("P001", 1000)).await.unwrap();

        let closed = register.close_session(0).await.unwrap();
        assert_eq!(closed.id, session.id);
        assert!(register.cart().await.is_empty());

        let result = register.add_product(product("P001", 1000)).await;
        assert!(matches!(result, Err(TillError::Precondition(_))));
    }

    #[tokio::test]
    async fn test_resume_attaches_to_open_session() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let bus = ChangeBus::new();

        let first = Register::new(store.clone(), bus.clone());
        let session = first
            .open_session("Shift", "c", 0, DeviceProfile::default())
            .await
            .unwrap();

        // A second window over the same store picks the session up
        let second = Register::new(store.clone(), bus);
        let resumed = second.resume().await.unwrap().unwrap();
        assert_eq!(resumed.id, session.id);

        // And can ring up items immediately
        second.add_product(product("P001", 1000)).await.unwrap();
    }

    #[tokio::test]
    async fn test_resume_without_session_is_none() {
        let register = register();
        assert!(register.resume().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cash_movements_via_facade() {
        let register = register();
        register
            .open_session("Shift", "c", 10_000, DeviceProfile::default())
            .await
            .unwrap();

        register.cash_in(2000, "float top-up").await.unwrap();
        register.cash_out(500, "window cleaner").await.unwrap();

        assert_eq!(register.cash_balance_minor().await.unwrap(), 11_500);
    }
}
