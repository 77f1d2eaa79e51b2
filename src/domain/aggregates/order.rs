//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::address::DeliveryAddress;
use crate::domain::aggregates::cart::CartLine;
use crate::domain::aggregates::checkout::CheckoutTotals;
use crate::domain::value_objects::{Money, OrderId, PaymentMethod, UserId};

/// Fulfilment progress. The declaration order is the progression order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Placed,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [Self::Placed, Self::Processing, Self::Shipped, Self::Delivered];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }

    /// Every stage with whether this status has reached it.
    pub fn timeline(self) -> Vec<TimelineStep> {
        Self::ALL.iter().map(|&stage| TimelineStep { stage, reached: stage <= self }).collect()
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| UnknownOrderStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub stage: OrderStatus,
    pub reached: bool,
}

/// Everything needed to write an order document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub items: Vec<CartLine>,
    pub address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub total_amount: Money,
}

impl NewOrder {
    pub fn draft(
        items: &[CartLine],
        address: Option<&DeliveryAddress>,
        payment_method: PaymentMethod,
        totals: &CheckoutTotals,
    ) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let address = address.ok_or(OrderError::MissingAddress)?;
        Ok(Self {
            items: items.to_vec(),
            address: address.clone(),
            payment_method,
            total_amount: totals.total.clone(),
        })
    }
}

/// A persisted order. Only `status` changes after creation, and never from here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub owner_id: UserId,
    pub items: Vec<CartLine>,
    pub address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub total_amount: Money,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn place(id: OrderId, owner_id: UserId, order: NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            items: order.items,
            address: order.address,
            payment_method: order.payment_method,
            total_amount: order.total_amount,
            status: OrderStatus::Placed,
            created_at,
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool { &self.owner_id == user }
    pub fn item_count(&self) -> u64 { self.items.iter().map(|l| u64::from(l.quantity)).sum() }
    pub fn timeline(&self) -> Vec<TimelineStep> { self.status.timeline() }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("order has no items")]
    NoItems,
    #[error("Delivery address is required")]
    MissingAddress,
}
