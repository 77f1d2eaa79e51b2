//! Cart service: the authoritative cart of one browser session.
//!
//! Owns the in-memory [`Cart`], decides which store is authoritative (guest
//! storage or the signed-in user's cart document) and writes every mutation
//! through to it. All mutations, including merge-on-sign-in, are serialized
//! behind one async lock.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::aggregates::{Cart, CartLine};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{LineKey, UserId};
use crate::infra::EventSink;
use crate::ports::{DocumentStore, GuestCartStore, StoreResult};
use crate::Result;

/// What happens when a cart write fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CartWriteMode {
    /// Await the write; on failure restore the previous cart and report the error.
    #[default]
    Strict,
    /// Keep the mutation; record the failure for the caller to show later.
    Optimistic,
}

impl FromStr for CartWriteMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "optimistic" => Ok(Self::Optimistic),
            other => Err(format!("expected strict or optimistic, got {other}")),
        }
    }
}

/// Which store is authoritative. Moving to `Merged` is the merge-on-sign-in
/// step and happens exactly once per sign-in.
#[derive(Clone, Debug, PartialEq, Eq)]
enum MergeGate {
    Guest,
    Merged(UserId),
}

struct CartState {
    cart: Cart,
    gate: MergeGate,
    sync_error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub count: u64,
    /// Last write that failed in optimistic mode, if not yet shown.
    pub sync_error: Option<String>,
}

pub struct CartService<S> {
    store: Arc<S>,
    guest: Arc<dyn GuestCartStore>,
    mode: CartWriteMode,
    events: EventSink,
    state: Mutex<CartState>,
}

impl<S> CartService<S>
where
    S: DocumentStore + Send + Sync + 'static,
{
    /// Starts as a guest cart loaded from device storage.
    pub fn new(store: Arc<S>, guest: Arc<dyn GuestCartStore>, mode: CartWriteMode, events: EventSink) -> Self {
        let lines = guest.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "guest cart unreadable, starting empty");
            Vec::new()
        });
        Self {
            store,
            guest,
            mode,
            events,
            state: Mutex::new(CartState { cart: Cart::from_lines(lines), gate: MergeGate::Guest, sync_error: None }),
        }
    }

    pub async fn lines(&self) -> Vec<CartLine> { self.state.lock().await.cart.snapshot() }

    pub async fn count(&self) -> u64 { self.state.lock().await.cart.count() }

    /// Current cart; hands over any pending sync error exactly once.
    pub async fn view(&self) -> CartView {
        let mut state = self.state.lock().await;
        CartView { lines: state.cart.snapshot(), count: state.cart.count(), sync_error: state.sync_error.take() }
    }

    pub async fn owner(&self) -> Option<UserId> {
        match &self.state.lock().await.gate {
            MergeGate::Guest => None,
            MergeGate::Merged(user) => Some(user.clone()),
        }
    }

    /// Adds one unit; returns the line's new quantity.
    pub async fn add(&self, line: CartLine) -> Result<u32> {
        line.check_price()?;
        self.mutate(|cart| cart.add(line)).await
    }

    pub async fn remove(&self, key: &LineKey) -> Result<bool> {
        self.mutate(|cart| cart.remove(key)).await
    }

    pub async fn set_quantity(&self, key: &LineKey, quantity: i64) -> Result<bool> {
        self.mutate(|cart| cart.set_quantity(key, quantity)).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.mutate(Cart::clear).await
    }

    /// Merge-on-sign-in. Folds the guest cart into `user`'s stored cart, makes
    /// the result authoritative and discards guest storage.
    ///
    /// Returns `Ok(false)` without touching anything when this sign-in has
    /// already been merged.
    pub async fn sign_in(&self, user: &UserId) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.gate == MergeGate::Merged(user.clone()) {
            tracing::debug!(user_id = %user, "cart already merged for this sign-in");
            return Ok(false);
        }

        let remote = self.store.get_cart(user).await?;
        let local = match state.gate {
            MergeGate::Guest => state.cart.snapshot(),
            MergeGate::Merged(_) => self.guest.load()?,
        };
        let merged = Cart::merge(&remote, &local);

        if let Err(e) = self.store.set_cart(user, merged.lines()).await {
            match self.mode {
                CartWriteMode::Strict => return Err(e.into()),
                CartWriteMode::Optimistic => {
                    tracing::warn!(user_id = %user, error = %e, "merged cart not saved");
                    state.sync_error = Some(e.to_string());
                }
            }
        }
        if let Err(e) = self.guest.discard() {
            tracing::warn!(error = %e, "failed to discard guest cart after merge");
        }

        tracing::info!(user_id = %user, guest_lines = local.len(), units = merged.count(), "cart merged on sign-in");
        let event = DomainEvent::CartMerged { user_id: user.clone(), guest_lines: local.len(), units: merged.count() };
        state.cart = merged;
        state.gate = MergeGate::Merged(user.clone());
        drop(state);
        self.events.publish(event).await;
        Ok(true)
    }

    /// Back to the guest cart held on the device.
    pub async fn sign_out(&self) {
        let mut state = self.state.lock().await;
        let lines = self.guest.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "guest cart unreadable after sign-out");
            Vec::new()
        });
        state.cart = Cart::from_lines(lines);
        state.gate = MergeGate::Guest;
        state.sync_error = None;
    }

    async fn mutate<T>(&self, change: impl FnOnce(&mut Cart) -> T) -> Result<T> {
        let mut state = self.state.lock().await;
        let before = state.cart.clone();
        let out = change(&mut state.cart);

        let written = self.persist(&state.gate, &state.cart).await;
        if let Err(e) = written {
            match self.mode {
                CartWriteMode::Strict => {
                    tracing::warn!(error = %e, "cart write failed, change rolled back");
                    state.cart = before;
                    return Err(e.into());
                }
                CartWriteMode::Optimistic => {
                    tracing::warn!(error = %e, "cart write failed, keeping local change");
                    state.sync_error = Some(e.to_string());
                }
            }
        }
        Ok(out)
    }

    async fn persist(&self, gate: &MergeGate, cart: &Cart) -> StoreResult<()> {
        match gate {
            MergeGate::Merged(user) => self.store.set_cart(user, cart.lines()).await,
            MergeGate::Guest if cart.is_empty() => self.guest.discard(),
            MergeGate::Guest => self.guest.save(cart.lines()),
        }
    }
}
