//! StandEase Storefront
//!
//! Cart, checkout and order history for the StandEase foot-comfort range.
//!
//! ## Features
//! - Guest carts kept on the device, merged into the account cart on sign-in
//! - Checkout sessions snapshotted from the cart or from a single "buy now" item
//! - Order submission guarded against double submits, with a simulated payment step
//! - Order history, saved addresses and profile avatar
//!
//! Persistence and identity are delegated to a hosted backend behind the
//! traits in [`ports`].

use thiserror::Error;

pub mod config;
pub mod domain;
pub mod infra;
pub mod ports;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

pub use config::{CheckoutSettings, SessionSettings, StorefrontConfig};
pub use session::StorefrontSession;

use domain::aggregates::{CheckoutError, OrderError};
use domain::value_objects::{MoneyError, ValidationError};
use ports::{AuthError, StoreError};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Rejected form input; handled where it was entered.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Missing, or owned by someone else. The two are deliberately indistinguishable.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Could not save your changes, please try again")]
    Persistence(#[from] StoreError),

    #[error("pricing error: {0}")]
    Pricing(#[from] MoneyError),
}

impl From<OrderError> for StorefrontError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NoItems => Self::Checkout(CheckoutError::EmptySession),
            OrderError::MissingAddress => Self::Validation(ValidationError::field("address", e.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
