//! In-memory adapters for local runs and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::aggregates::{Avatar, CartLine, NewAddress, NewOrder, OrderRecord, OrderStatus, SavedAddress, UserProfile};
use crate::domain::value_objects::{OrderId, UserId};
use crate::infra::credentials;
use crate::ports::{AuthError, DocumentStore, GuestCartStore, IdentityProvider, StoreError, StoreResult, UserIdentity};

/// Document store kept in process memory.
///
/// `set_offline(true)` makes every write fail, which is how tests model lost
/// connectivity.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<Documents>>,
    offline: Arc<AtomicBool>,
}

#[derive(Default)]
struct Documents {
    carts: HashMap<UserId, Vec<CartLine>>,
    addresses: HashMap<UserId, Vec<SavedAddress>>,
    orders: Vec<OrderRecord>,
    profiles: HashMap<UserId, UserProfile>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self { Self::default() }

    pub fn set_offline(&self, offline: bool) { self.offline.store(offline, Ordering::SeqCst); }

    pub fn order_count(&self) -> usize { self.inner.read().expect("in-memory store lock poisoned").orders.len() }

    /// Stand-in for the external fulfilment process that advances order status.
    pub fn set_order_status(&self, id: OrderId, status: OrderStatus) -> bool {
        let mut inner = self.inner.write().expect("in-memory store lock poisoned");
        match inner.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => { order.status = status; true }
            None => false,
        }
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("no connectivity".to_string()));
        }
        Ok(())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    async fn get_cart(&self, user: &UserId) -> StoreResult<Vec<CartLine>> {
        let inner = self.inner.read().expect("in-memory store lock poisoned");
        Ok(inner.carts.get(user).cloned().unwrap_or_default())
    }

    async fn set_cart(&self, user: &UserId, lines: &[CartLine]) -> StoreResult<()> {
        self.check_online()?;
        let mut inner = self.inner.write().expect("in-memory store lock poisoned");
        inner.carts.insert(user.clone(), lines.to_vec());
        Ok(())
    }

    async fn get_addresses(&self, user: &UserId) -> StoreResult<Vec<SavedAddress>> {
        let inner = self.inner.read().expect("in-memory store lock poisoned");
        let mut addresses = inner.addresses.get(user).cloned().unwrap_or_default();
        addresses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(addresses)
    }

    async fn add_address(&self, user: &UserId, address: NewAddress) -> StoreResult<Uuid> {
        self.check_online()?;
        let mut inner = self.inner.write().expect("in-memory store lock poisoned");
        let book = inner.addresses.entry(user.clone()).or_default();
        if address.is_default {
            book.iter_mut().for_each(|a| a.is_default = false);
        }
        let id = Uuid::now_v7();
        book.push(SavedAddress { id, address: address.address, is_default: address.is_default, created_at: Utc::now() });
        Ok(id)
    }

    async fn set_default_address(&self, user: &UserId, address_id: Uuid) -> StoreResult<bool> {
        self.check_online()?;
        let mut inner = self.inner.write().expect("in-memory store lock poisoned");
        let Some(book) = inner.addresses.get_mut(user) else { return Ok(false) };
        if !book.iter().any(|a| a.id == address_id) { return Ok(false); }
        book.iter_mut().for_each(|a| a.is_default = a.id == address_id);
        Ok(true)
    }

    async fn create_order(&self, user: &UserId, order: NewOrder) -> StoreResult<OrderId> {
        self.check_online()?;
        let id = OrderId::generate();
        let record = OrderRecord::place(id, user.clone(), order, Utc::now());
        self.inner.write().expect("in-memory store lock poisoned").orders.push(record);
        Ok(id)
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<OrderRecord>> {
        let inner = self.inner.read().expect("in-memory store lock poisoned");
        Ok(inner.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, user: &UserId) -> StoreResult<Vec<OrderRecord>> {
        let inner = self.inner.read().expect("in-memory store lock poisoned");
        // Appended in creation order; newest first means reversed.
        Ok(inner.orders.iter().rev().filter(|o| o.is_owned_by(user)).cloned().collect())
    }

    async fn ensure_profile(&self, user: &UserId, email: &str) -> StoreResult<bool> {
        self.check_online()?;
        let mut inner = self.inner.write().expect("in-memory store lock poisoned");
        if inner.profiles.contains_key(user) { return Ok(false); }
        inner.profiles.insert(user.clone(), UserProfile::new(user.clone(), email));
        Ok(true)
    }

    async fn get_profile(&self, user: &UserId) -> StoreResult<Option<UserProfile>> {
        Ok(self.inner.read().expect("in-memory store lock poisoned").profiles.get(user).cloned())
    }

    async fn set_avatar(&self, user: &UserId, avatar: &Avatar) -> StoreResult<()> {
        self.check_online()?;
        let mut inner = self.inner.write().expect("in-memory store lock poisoned");
        match inner.profiles.get_mut(user) {
            Some(profile) => { profile.avatar = avatar.clone(); Ok(()) }
            None => Err(StoreError::Unavailable(format!("no profile document for {user}"))),
        }
    }
}

/// Guest cart held in memory for one browser session.
#[derive(Clone, Default)]
pub struct MemoryGuestCart {
    lines: Arc<RwLock<Option<Vec<CartLine>>>>,
}

impl MemoryGuestCart {
    pub fn new() -> Self { Self::default() }
    pub fn is_stored(&self) -> bool { self.lines.read().expect("guest cart lock poisoned").is_some() }
}

impl GuestCartStore for MemoryGuestCart {
    fn load(&self) -> StoreResult<Vec<CartLine>> {
        Ok(self.lines.read().expect("guest cart lock poisoned").clone().unwrap_or_default())
    }

    fn save(&self, lines: &[CartLine]) -> StoreResult<()> {
        *self.lines.write().expect("guest cart lock poisoned") = Some(lines.to_vec());
        Ok(())
    }

    fn discard(&self) -> StoreResult<()> {
        *self.lines.write().expect("guest cart lock poisoned") = None;
        Ok(())
    }
}

/// Identity provider backed by an in-memory credential table.
#[derive(Clone, Default)]
pub struct InMemoryIdentity {
    accounts: Arc<RwLock<HashMap<String, (UserId, String)>>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self { Self::default() }
}

impl IdentityProvider for InMemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let email = credentials::normalize_email(email)?;
        let account = self.accounts.read().expect("identity lock poisoned").get(&email).cloned();
        let Some((uid, phc)) = account else { return Err(AuthError::InvalidCredentials) };
        if credentials::verify_password(password, &phc).await? {
            Ok(UserIdentity { uid, email })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let email = credentials::normalize_email(email)?;
        credentials::check_password_policy(password)?;
        let phc = credentials::hash_password(password).await?;
        let mut accounts = self.accounts.write().expect("identity lock poisoned");
        if accounts.contains_key(&email) { return Err(AuthError::EmailInUse); }
        let uid = UserId::new(Uuid::new_v4().simple().to_string());
        accounts.insert(email.clone(), (uid.clone(), phc));
        Ok(UserIdentity { uid, email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::address::tests::address;

    #[tokio::test]
    async fn test_only_one_default_address() {
        let store = InMemoryDocumentStore::new();
        let user = UserId::new("u1");
        let first = store.add_address(&user, NewAddress::for_book(address(), 0, false)).await.unwrap();
        let second = store.add_address(&user, NewAddress::for_book(address(), 1, true)).await.unwrap();
        let book = store.get_addresses(&user).await.unwrap();
        assert_eq!(book.iter().filter(|a| a.is_default).count(), 1);
        assert!(book.iter().any(|a| a.id == second && a.is_default));

        assert!(store.set_default_address(&user, first).await.unwrap());
        let book = store.get_addresses(&user).await.unwrap();
        assert_eq!(book.iter().filter(|a| a.is_default).map(|a| a.id).collect::<Vec<_>>(), vec![first]);
        assert!(!store.set_default_address(&UserId::new("u2"), first).await.unwrap());
    }

    #[tokio::test]
    async fn test_offline_store_rejects_writes() {
        let store = InMemoryDocumentStore::new();
        store.set_offline(true);
        let err = store.set_cart(&UserId::new("u1"), &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_identity_sign_up_then_in() {
        let identity = InMemoryIdentity::new();
        let created = identity.sign_up("asha@example.com", "stand-easy").await.unwrap();
        assert!(matches!(identity.sign_up("ASHA@example.com", "another-one").await, Err(AuthError::EmailInUse)));
        let signed_in = identity.sign_in("asha@example.com", "stand-easy").await.unwrap();
        assert_eq!(signed_in, created);
        assert!(matches!(identity.sign_in("asha@example.com", "wrong-pass").await, Err(AuthError::InvalidCredentials)));
        assert!(matches!(identity.sign_in("nobody@example.com", "stand-easy").await, Err(AuthError::InvalidCredentials)));
    }
}
