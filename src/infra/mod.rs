//! Adapters for the ports in [`crate::ports`].
pub mod credentials;
pub mod events;
pub mod guest_file;
pub mod memory;
pub mod postgres;

pub use events::EventSink;
pub use guest_file::{sanitize_session_key, FileGuestCart, GUEST_CART_KEY};
pub use memory::{InMemoryDocumentStore, InMemoryIdentity, MemoryGuestCart};
pub use postgres::{PgDocumentStore, PgIdentityProvider};
