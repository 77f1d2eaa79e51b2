//! Aggregates module
pub mod address;
pub mod cart;
pub mod checkout;
pub mod order;
pub mod profile;

pub use address::{DeliveryAddress, NewAddress, SavedAddress};
pub use cart::{Cart, CartLine, MAX_LINE_QUANTITY, MAX_UNIT_PRICE};
pub use checkout::{CheckoutError, CheckoutSession, CheckoutTotals, ShippingPolicy};
pub use order::{NewOrder, OrderError, OrderRecord, OrderStatus, TimelineStep};
pub use profile::{Avatar, UnknownAvatar, UserProfile, AVATARS};
