//! One browser session: identity, cart, checkout and order submission wired
//! over the injected backend adapters.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::CheckoutSettings;
use crate::domain::aggregates::{
    Avatar, CartLine, CheckoutError, CheckoutSession, CheckoutTotals, DeliveryAddress, NewAddress, NewOrder, OrderRecord, SavedAddress,
};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{OrderId, PaymentMethod, ValidationError};
use crate::infra::EventSink;
use crate::ports::{DocumentStore, GuestCartStore, IdentityProvider, UserIdentity};
use crate::services::orders::{OrderSubmission, PaymentOutcome, Redirect, SimulatedGateway, SubmissionState, SubmitOutcome};
use crate::services::{AuthSession, CartService};
use crate::{Result, StorefrontError};

/// What the checkout and payment pages show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutView {
    pub items: Vec<CartLine>,
    pub address: Option<DeliveryAddress>,
    pub payment_method: PaymentMethod,
    pub totals: CheckoutTotals,
    pub submission: SubmissionState,
}

pub struct StorefrontSession<S, I> {
    store: Arc<S>,
    auth: AuthSession<I>,
    cart: CartService<S>,
    checkout: Mutex<CheckoutSession>,
    submission: OrderSubmission,
    gateway: SimulatedGateway,
    settings: CheckoutSettings,
    events: EventSink,
}

impl<S, I> StorefrontSession<S, I>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    pub fn new(
        store: Arc<S>,
        identity: Arc<I>,
        guest: Arc<dyn GuestCartStore>,
        settings: CheckoutSettings,
        events: EventSink,
    ) -> Self {
        Self {
            cart: CartService::new(store.clone(), guest, settings.cart_write_mode, events.clone()),
            auth: AuthSession::new(identity),
            store,
            checkout: Mutex::new(CheckoutSession::new()),
            submission: OrderSubmission::new(),
            gateway: SimulatedGateway::new(settings.payment_delay),
            settings,
            events,
        }
    }

    pub fn cart(&self) -> &CartService<S> { &self.cart }

    pub fn current_user(&self) -> Option<UserIdentity> { self.auth.current_user() }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let user = self.auth.sign_in(email, password).await?;
        self.on_signed_in(&user).await?;
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let user = self.auth.sign_up(email, password).await?;
        self.on_signed_in(&user).await?;
        Ok(user)
    }

    /// The checkout session survives sign-out; only the cart switches back to guest storage.
    pub async fn sign_out(&self) {
        self.auth.sign_out();
        self.cart.sign_out().await;
    }

    async fn on_signed_in(&self, user: &UserIdentity) -> Result<()> {
        match self.store.ensure_profile(&user.uid, &user.email).await {
            Ok(true) => tracing::info!(user_id = %user.uid, "profile created"),
            Ok(false) => {}
            Err(e) => tracing::warn!(user_id = %user.uid, error = %e, "could not ensure profile"),
        }
        if let Err(e) = self.cart.sign_in(&user.uid).await {
            // Without a merged cart the session would write to the wrong store.
            tracing::error!(user_id = %user.uid, error = %e, "cart merge failed, signing out");
            self.auth.sign_out();
            return Err(e);
        }
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Snapshots the current cart into a fresh checkout.
    pub async fn checkout_from_cart(&self) -> Result<CheckoutView> {
        let lines = self.cart.lines().await;
        let mut checkout = self.checkout.lock().await;
        self.ensure_not_submitting()?;
        checkout.start_from_cart(&lines)?;
        self.submission.reset();
        self.view(&checkout)
    }

    /// "Buy now" from a product page; the cart is left alone.
    pub async fn buy_now(&self, line: CartLine, quantity: u32) -> Result<CheckoutView> {
        line.check_price()?;
        let mut checkout = self.checkout.lock().await;
        self.ensure_not_submitting()?;
        checkout.start_from_single_item(line, quantity)?;
        self.submission.reset();
        self.view(&checkout)
    }

    /// Fails with `EmptySession` when there is nothing to check out.
    pub async fn checkout_view(&self) -> Result<CheckoutView> {
        let checkout = self.checkout.lock().await;
        checkout.require_items()?;
        self.view(&checkout)
    }

    /// Uses an address entered on the checkout form, optionally saving it to the address book.
    pub async fn set_checkout_address(&self, address: DeliveryAddress, save: bool) -> Result<CheckoutView> {
        let address = address.validated()?;
        {
            let checkout = self.checkout.lock().await;
            self.ensure_not_submitting()?;
            checkout.require_items()?;
        }
        if save {
            self.add_address(address.clone(), false).await?;
        }
        let mut checkout = self.checkout.lock().await;
        self.ensure_not_submitting()?;
        checkout.require_items()?;
        checkout.set_address(Some(address));
        self.view(&checkout)
    }

    pub async fn use_saved_address(&self, address_id: Uuid) -> Result<CheckoutView> {
        let user = self.auth.require_user()?;
        let saved = self
            .store
            .get_addresses(&user.uid)
            .await?
            .into_iter()
            .find(|a| a.id == address_id)
            .ok_or(StorefrontError::NotFound("address"))?;
        let mut checkout = self.checkout.lock().await;
        self.ensure_not_submitting()?;
        checkout.require_items()?;
        checkout.set_address(Some(saved.address));
        self.view(&checkout)
    }

    pub async fn set_payment_method(&self, method: PaymentMethod) -> Result<CheckoutView> {
        let mut checkout = self.checkout.lock().await;
        self.ensure_not_submitting()?;
        checkout.require_items()?;
        checkout.set_payment_method(method);
        self.view(&checkout)
    }

    pub async fn cancel_checkout(&self) -> Result<()> {
        let mut checkout = self.checkout.lock().await;
        self.ensure_not_submitting()?;
        checkout.clear();
        self.submission.reset();
        Ok(())
    }

    /// The session being paid for is frozen until its submission settles.
    /// Callers hold the checkout lock, which `submit_order` also holds when it
    /// enters `Submitting`.
    fn ensure_not_submitting(&self) -> Result<()> {
        if self.submission.state() == SubmissionState::Submitting {
            return Err(CheckoutError::SubmissionInProgress.into());
        }
        Ok(())
    }

    pub fn submission_state(&self) -> SubmissionState { self.submission.state() }

    /// Places the order for the current checkout.
    ///
    /// Online methods go through the simulated gateway first; a declined
    /// payment never writes an order. A submission arriving while another is
    /// in flight is ignored.
    pub async fn submit_order(&self, outcome: PaymentOutcome) -> Result<SubmitOutcome> {
        let user = self.auth.require_user()?;
        let (draft, totals) = {
            let checkout = self.checkout.lock().await;
            let items = checkout.require_items()?;
            let totals = checkout.totals(&self.settings.shipping)?;
            let draft = NewOrder::draft(items, checkout.address(), checkout.payment_method(), &totals)?;
            if !self.submission.try_begin() {
                tracing::debug!(user_id = %user.uid, "submission already in progress, ignoring");
                return Ok(SubmitOutcome::Ignored);
            }
            (draft, totals)
        };

        let method = draft.payment_method;
        if method.is_online() {
            if let Err(reason) = self.gateway.charge(&totals.total, outcome).await {
                tracing::info!(user_id = %user.uid, payment_method = %method, "payment declined");
                self.submission.fail(reason);
                self.events.publish(DomainEvent::PaymentDeclined { user_id: user.uid.clone(), payment_method: method }).await;
                return Ok(SubmitOutcome::Failed { reason: reason.to_string() });
            }
        }

        let order_id = match self.store.create_order(&user.uid, draft).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(user_id = %user.uid, error = %e, "order creation failed");
                self.submission.fail(e.to_string());
                return Err(e.into());
            }
        };
        {
            // Cleared under the lock before leaving `Submitting`, so a checkout
            // started after placement is never the one wiped.
            let mut checkout = self.checkout.lock().await;
            checkout.clear();
            self.submission.place(order_id);
        }
        tracing::info!(user_id = %user.uid, %order_id, total = %totals.total, "order placed");

        // Separate write from the order; the order stands even if this fails.
        if let Err(e) = self.cart.clear().await {
            tracing::warn!(user_id = %user.uid, %order_id, error = %e, "cart not cleared after order");
        }

        self.events
            .publish(DomainEvent::OrderPlaced {
                order_id,
                user_id: user.uid.clone(),
                total: totals.total.amount(),
                payment_method: method,
            })
            .await;

        Ok(SubmitOutcome::Placed {
            order_id,
            total: totals.total,
            redirect: Redirect::to_orders(self.settings.redirect_delay),
        })
    }

    fn view(&self, checkout: &CheckoutSession) -> Result<CheckoutView> {
        Ok(CheckoutView {
            items: checkout.items().to_vec(),
            address: checkout.address().cloned(),
            payment_method: checkout.payment_method(),
            totals: checkout.totals(&self.settings.shipping)?,
            submission: self.submission.state(),
        })
    }

    // =========================================================================
    // Orders
    // =========================================================================

    pub async fn list_orders(&self) -> Result<Vec<OrderRecord>> {
        let user = self.auth.require_user()?;
        Ok(self.store.list_orders(&user.uid).await?)
    }

    /// Foreign and missing orders are both `NotFound`.
    pub async fn get_order(&self, id: &str) -> Result<OrderRecord> {
        let user = self.auth.require_user()?;
        let id = OrderId::parse(id).ok_or(StorefrontError::NotFound("order"))?;
        match self.store.get_order(id).await? {
            Some(order) if order.is_owned_by(&user.uid) => Ok(order),
            Some(_) => {
                tracing::warn!(user_id = %user.uid, order_id = %id, "foreign order requested");
                Err(StorefrontError::NotFound("order"))
            }
            None => Err(StorefrontError::NotFound("order")),
        }
    }

    // =========================================================================
    // Address book & profile
    // =========================================================================

    pub async fn list_addresses(&self) -> Result<Vec<SavedAddress>> {
        let user = self.auth.require_user()?;
        Ok(self.store.get_addresses(&user.uid).await?)
    }

    /// The first saved address becomes the default regardless of `make_default`.
    pub async fn add_address(&self, address: DeliveryAddress, make_default: bool) -> Result<Uuid> {
        let address = address.validated()?;
        let user = self.auth.require_user()?;
        let existing = self.store.get_addresses(&user.uid).await?.len();
        let id = self.store.add_address(&user.uid, NewAddress::for_book(address, existing, make_default)).await?;
        tracing::info!(user_id = %user.uid, address_id = %id, "address saved");
        Ok(id)
    }

    pub async fn set_default_address(&self, address_id: Uuid) -> Result<()> {
        let user = self.auth.require_user()?;
        if !self.store.set_default_address(&user.uid, address_id).await? {
            return Err(StorefrontError::NotFound("address"));
        }
        Ok(())
    }

    pub async fn avatar(&self) -> Result<Avatar> {
        let user = self.auth.require_user()?;
        Ok(self.store.get_profile(&user.uid).await?.map(|p| p.avatar).unwrap_or_default())
    }

    pub async fn set_avatar(&self, name: &str) -> Result<Avatar> {
        let avatar = Avatar::parse(name).map_err(|e| ValidationError::field("avatar", e.to_string()))?;
        let user = self.auth.require_user()?;
        self.store.ensure_profile(&user.uid, &user.email).await?;
        self.store.set_avatar(&user.uid, &avatar).await?;
        Ok(avatar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::address::tests::address;
    use crate::domain::aggregates::cart::tests::line;
    use crate::infra::{InMemoryDocumentStore, InMemoryIdentity, MemoryGuestCart};
    use crate::ports::AuthError;
    use std::time::Duration;

    fn session() -> (StorefrontSession<InMemoryDocumentStore, InMemoryIdentity>, InMemoryDocumentStore) {
        let store = InMemoryDocumentStore::new();
        let settings = CheckoutSettings { payment_delay: Duration::ZERO, ..CheckoutSettings::default() };
        let session = StorefrontSession::new(
            Arc::new(store.clone()),
            Arc::new(InMemoryIdentity::new()),
            Arc::new(MemoryGuestCart::new()),
            settings,
            EventSink::Log,
        );
        (session, store)
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_and_merges_cart() {
        let (session, store) = session();
        session.cart().add(line(1, "M", "black", 1, 10)).await.unwrap();
        let user = session.sign_up("meera@example.com", "comfy-feet").await.unwrap();

        assert!(store.get_profile(&user.uid).await.unwrap().is_some());
        assert_eq!(store.get_cart(&user.uid).await.unwrap().len(), 1);
        assert_eq!(session.avatar().await.unwrap(), Avatar::default());
    }

    #[tokio::test]
    async fn test_merge_failure_signs_back_out() {
        let (session, store) = session();
        session.sign_up("meera@example.com", "comfy-feet").await.unwrap();
        session.sign_out().await;

        store.set_offline(true);
        let err = session.sign_in("meera@example.com", "comfy-feet").await.unwrap_err();
        assert!(matches!(err, StorefrontError::Persistence(_)));
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_checkout_snapshot_ignores_later_cart_edits() {
        let (session, _) = session();
        session.cart().add(line(1, "M", "black", 1, 10)).await.unwrap();
        session.checkout_from_cart().await.unwrap();
        session.cart().add(line(2, "L", "red", 1, 20)).await.unwrap();

        assert_eq!(session.checkout_view().await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_requires_address_and_sign_in() {
        let (session, _) = session();
        session.buy_now(line(1, "M", "black", 1, 10), 2).await.unwrap();
        assert!(matches!(
            session.submit_order(PaymentOutcome::Success).await,
            Err(StorefrontError::Auth(AuthError::SignInRequired))
        ));

        session.sign_up("meera@example.com", "comfy-feet").await.unwrap();
        let err = session.submit_order(PaymentOutcome::Success).await.unwrap_err();
        match err {
            StorefrontError::Validation(v) => assert_eq!(v.fields["address"], "Delivery address is required"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.submission_state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected_with_field_messages() {
        let (session, _) = session();
        session.buy_now(line(1, "M", "black", 1, 10), 1).await.unwrap();
        let mut bad = address();
        bad.email = "not-an-email".into();
        bad.city = "   ".into();
        match session.set_checkout_address(bad, false).await.unwrap_err() {
            StorefrontError::Validation(v) => {
                assert_eq!(v.fields["email"], "Invalid email format");
                assert_eq!(v.fields["city"], "City is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(session.checkout_view().await.unwrap().address.is_none());
    }

    #[tokio::test]
    async fn test_declined_payment_writes_nothing_and_can_retry() {
        let (session, store) = session();
        session.sign_up("meera@example.com", "comfy-feet").await.unwrap();
        session.buy_now(line(1, "M", "black", 1, 10), 1).await.unwrap();
        session.set_checkout_address(address(), false).await.unwrap();
        session.set_payment_method(PaymentMethod::Upi).await.unwrap();

        let declined = session.submit_order(PaymentOutcome::Failure).await.unwrap();
        assert_eq!(declined, SubmitOutcome::Failed { reason: "Payment failed. Please try again.".into() });
        assert_eq!(store.order_count(), 0);
        assert!(!session.checkout_view().await.unwrap().items.is_empty());

        let placed = session.submit_order(PaymentOutcome::Success).await.unwrap();
        assert!(matches!(placed, SubmitOutcome::Placed { .. }));
        assert_eq!(store.order_count(), 1);
    }

    #[tokio::test]
    async fn test_saved_address_flow() {
        let (session, _) = session();
        session.sign_up("meera@example.com", "comfy-feet").await.unwrap();
        let first = session.add_address(address(), false).await.unwrap();
        let second = session.add_address(address(), false).await.unwrap();
        let book = session.list_addresses().await.unwrap();
        assert!(book.iter().any(|a| a.id == first && a.is_default));
        assert!(book.iter().any(|a| a.id == second && !a.is_default));

        session.set_default_address(second).await.unwrap();
        assert!(matches!(session.set_default_address(Uuid::nil()).await, Err(StorefrontError::NotFound("address"))));

        session.buy_now(line(1, "M", "black", 1, 10), 1).await.unwrap();
        let view = session.use_saved_address(second).await.unwrap();
        assert_eq!(view.address, Some(address()));
    }

    #[tokio::test]
    async fn test_avatar_must_be_known() {
        let (session, _) = session();
        session.sign_up("meera@example.com", "comfy-feet").await.unwrap();
        assert_eq!(session.set_avatar("avatar-f1").await.unwrap().as_str(), "avatar-f1");
        assert_eq!(session.avatar().await.unwrap().as_str(), "avatar-f1");
        assert!(matches!(session.set_avatar("dragon").await, Err(StorefrontError::Validation(_))));
    }

    #[tokio::test]
    async fn test_buy_now_rejects_unusable_prices() {
        let (session, _) = session();
        let mut priceless = line(1, "M", "black", 1, 10);
        priceless.unit_price = crate::domain::value_objects::Money::inr(rust_decimal::Decimal::MAX);
        match session.buy_now(priceless, 2).await.unwrap_err() {
            StorefrontError::Validation(v) => assert_eq!(v.fields["unit_price"], "Price is out of range"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(session.buy_now(line(1, "M", "black", 1, -1), 1).await, Err(StorefrontError::Validation(_))));
        assert!(matches!(session.checkout_view().await, Err(StorefrontError::Checkout(CheckoutError::EmptySession))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkout_is_frozen_while_payment_is_in_flight() {
        let store = InMemoryDocumentStore::new();
        let settings = CheckoutSettings { payment_delay: Duration::from_millis(1500), ..CheckoutSettings::default() };
        let session = Arc::new(StorefrontSession::new(
            Arc::new(store.clone()),
            Arc::new(InMemoryIdentity::new()),
            Arc::new(MemoryGuestCart::new()),
            settings,
            EventSink::Log,
        ));
        session.sign_up("meera@example.com", "comfy-feet").await.unwrap();
        session.buy_now(line(1, "M", "black", 1, 30), 1).await.unwrap();
        session.set_checkout_address(address(), false).await.unwrap();
        session.set_payment_method(PaymentMethod::Card).await.unwrap();

        let paying = tokio::spawn({
            let session = session.clone();
            async move { session.submit_order(PaymentOutcome::Success).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.submission_state(), SubmissionState::Submitting);

        let busy = |r: Result<CheckoutView>| matches!(r, Err(StorefrontError::Checkout(CheckoutError::SubmissionInProgress)));
        assert!(busy(session.buy_now(line(2, "L", "tan", 1, 20), 3).await));
        assert!(busy(session.set_payment_method(PaymentMethod::Upi).await));
        assert!(matches!(
            session.cancel_checkout().await,
            Err(StorefrontError::Checkout(CheckoutError::SubmissionInProgress))
        ));

        assert!(matches!(paying.await.unwrap().unwrap(), SubmitOutcome::Placed { .. }));
        assert_eq!(store.order_count(), 1);
        let placed = store.list_orders(&session.current_user().unwrap().uid).await.unwrap();
        assert_eq!(placed[0].items[0].product_id, crate::domain::value_objects::ProductId(1));

        let view = session.buy_now(line(2, "L", "tan", 1, 20), 3).await.unwrap();
        assert_eq!(view.items[0].quantity, 3);
        assert_eq!(view.submission, SubmissionState::Idle);
        assert_eq!(session.checkout_view().await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_checkout_is_reported() {
        let (session, _) = session();
        assert!(matches!(session.checkout_from_cart().await, Err(StorefrontError::Checkout(CheckoutError::NothingToCheckout))));
        assert!(matches!(session.checkout_view().await, Err(StorefrontError::Checkout(CheckoutError::EmptySession))));
    }
}
