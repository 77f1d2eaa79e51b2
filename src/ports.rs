//! Boundaries to the hosted backend and to device-local storage.
//!
//! Adapters live in [`crate::infra`]; services only see these traits.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Avatar, CartLine, NewAddress, NewOrder, OrderRecord, SavedAddress, UserProfile};
use crate::domain::value_objects::{OrderId, UserId};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A read or write against a backing store failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("local storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Hosted document database: cart documents, address sub-collections,
/// append-only order documents and the profile document.
#[trait_variant::make(DocumentStore: Send)]
pub trait LocalDocumentStore {
    async fn get_cart(&self, user: &UserId) -> StoreResult<Vec<CartLine>>;

    /// Replaces the whole cart document.
    async fn set_cart(&self, user: &UserId, lines: &[CartLine]) -> StoreResult<()>;

    /// Saved addresses, newest first.
    async fn get_addresses(&self, user: &UserId) -> StoreResult<Vec<SavedAddress>>;

    /// Saves an address. A default address takes the flag from every other one.
    async fn add_address(&self, user: &UserId, address: NewAddress) -> StoreResult<Uuid>;

    /// Returns false when the address does not belong to `user`.
    async fn set_default_address(&self, user: &UserId, address_id: Uuid) -> StoreResult<bool>;

    async fn create_order(&self, user: &UserId, order: NewOrder) -> StoreResult<OrderId>;

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<OrderRecord>>;

    /// Orders of `user`, newest first.
    async fn list_orders(&self, user: &UserId) -> StoreResult<Vec<OrderRecord>>;

    /// Creates the profile document if missing. Returns true when it was created.
    async fn ensure_profile(&self, user: &UserId, email: &str) -> StoreResult<bool>;

    async fn get_profile(&self, user: &UserId) -> StoreResult<Option<UserProfile>>;

    async fn set_avatar(&self, user: &UserId, avatar: &Avatar) -> StoreResult<()>;
}

/// Device-local guest cart. Always read and written whole.
pub trait GuestCartStore: Send + Sync {
    fn load(&self) -> StoreResult<Vec<CartLine>>;
    fn save(&self, lines: &[CartLine]) -> StoreResult<()>;
    fn discard(&self) -> StoreResult<()>;
}

/// A signed-in identity as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: UserId,
    pub email: String,
}

/// Sign-in and sign-up failures, each with a fixed user-facing message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailInUse,

    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please sign in to continue")]
    SignInRequired,

    #[error("Authentication is unavailable, please try again")]
    Unavailable(#[source] StoreError),
}

/// Hosted identity service.
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError>;
}
