//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::value_objects::{OrderId, PaymentMethod, UserId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    CartMerged { user_id: UserId, guest_lines: usize, units: u64 },
    OrderPlaced { order_id: OrderId, user_id: UserId, total: Decimal, payment_method: PaymentMethod },
    PaymentDeclined { user_id: UserId, payment_method: PaymentMethod },
}

impl DomainEvent {
    /// Subject the event is published under.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::CartMerged { .. } => "storefront.cart_merged",
            Self::OrderPlaced { .. } => "storefront.order_placed",
            Self::PaymentDeclined { .. } => "storefront.payment_declined",
        }
    }
}
