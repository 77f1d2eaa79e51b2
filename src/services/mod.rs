//! Per-session application services.

pub mod auth;
pub mod cart;
pub mod orders;

pub use auth::AuthSession;
pub use cart::{CartService, CartView, CartWriteMode};
pub use orders::{OrderSubmission, PaymentOutcome, Redirect, SimulatedGateway, SubmissionState, SubmitOutcome};
