//! Checkout Session
//!
//! A point-in-time copy of what is being bought. Editing the live cart after
//! checkout has started never reaches the session.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::address::DeliveryAddress;
use crate::domain::aggregates::cart::{CartLine, MAX_LINE_QUANTITY};
use crate::domain::value_objects::{Money, MoneyError, PaymentMethod};

/// Flat shipping fee with a hard free-shipping cutoff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShippingPolicy {
    pub flat_fee: Decimal,
    /// Orders with a subtotal strictly above this ship free.
    pub free_above: Decimal,
    pub currency: String,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self { flat_fee: Decimal::new(599, 2), free_above: Decimal::new(50, 0), currency: "INR".to_string() }
    }
}

impl ShippingPolicy {
    pub fn shipping_for(&self, subtotal: &Money) -> Money {
        if subtotal.amount() > self.free_above {
            Money::zero(subtotal.currency())
        } else {
            Money::new(self.flat_fee, subtotal.currency())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckoutSession {
    items: Vec<CartLine>,
    address: Option<DeliveryAddress>,
    payment_method: PaymentMethod,
}

impl CheckoutSession {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartLine] { &self.items }
    pub fn address(&self) -> Option<&DeliveryAddress> { self.address.as_ref() }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Snapshots `lines` as the purchase. An empty cart cannot start checkout.
    pub fn start_from_cart(&mut self, lines: &[CartLine]) -> Result<(), CheckoutError> {
        if lines.is_empty() { return Err(CheckoutError::NothingToCheckout); }
        self.items = lines.to_vec();
        Ok(())
    }

    /// "Buy now": a one-line session that bypasses the cart.
    pub fn start_from_single_item(&mut self, line: CartLine, quantity: u32) -> Result<(), CheckoutError> {
        if quantity == 0 || quantity > MAX_LINE_QUANTITY { return Err(CheckoutError::InvalidQuantity); }
        self.items = vec![line.with_quantity(quantity)];
        Ok(())
    }

    pub fn set_address(&mut self, address: Option<DeliveryAddress>) { self.address = address; }
    pub fn set_payment_method(&mut self, method: PaymentMethod) { self.payment_method = method; }

    /// Items of a live session. An empty session means the caller belongs on the cart page.
    pub fn require_items(&self) -> Result<&[CartLine], CheckoutError> {
        if self.items.is_empty() { Err(CheckoutError::EmptySession) } else { Ok(&self.items) }
    }

    pub fn totals(&self, policy: &ShippingPolicy) -> Result<CheckoutTotals, MoneyError> {
        let currency = self.items.first().map_or(policy.currency.as_str(), |l| l.unit_price.currency());
        let subtotal = self.items.iter().try_fold(Money::zero(currency), |acc, l| acc.add(&l.line_total()?))?;
        let shipping = policy.shipping_for(&subtotal);
        let total = subtotal.add(&shipping)?;
        Ok(CheckoutTotals { subtotal, shipping, total })
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.address = None;
        self.payment_method = PaymentMethod::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    NothingToCheckout,
    #[error("checkout session is empty")]
    EmptySession,
    #[error("quantity must be between 1 and 99")]
    InvalidQuantity,
    #[error("an order is already being placed")]
    SubmissionInProgress,
}
