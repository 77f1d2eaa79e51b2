//! Cart Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{LineKey, Money, MoneyError, ProductId, ValidationError};

/// Upper bound for the units held on one line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Highest unit price a line may carry.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// One selection in a cart. Identity is `(product_id, size, color)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub display_name: String,
    #[serde(default)]
    pub image_ref: String,
}

impl CartLine {
    pub fn key(&self) -> LineKey { LineKey::new(self.product_id, self.size.clone(), self.color.clone()) }
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }
    pub fn line_total(&self) -> Result<Money, MoneyError> { self.unit_price.multiply(self.quantity) }
    pub fn with_quantity(mut self, quantity: u32) -> Self { self.quantity = quantity; self }

    /// Rejects a unit price that is not strictly positive or exceeds [`MAX_UNIT_PRICE`].
    pub fn check_price(&self) -> Result<(), ValidationError> {
        let amount = self.unit_price.amount();
        if amount <= Decimal::ZERO {
            return Err(ValidationError::field("unit_price", "Price must be greater than zero"));
        }
        if amount > MAX_UNIT_PRICE {
            return Err(ValidationError::field("unit_price", "Price is out of range"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Builds a cart from stored lines, coalescing duplicate keys and dropping
    /// zero-quantity lines so a malformed document cannot break the invariants.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 { continue; }
            cart.absorb(line);
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn find(&self, key: &LineKey) -> Option<&CartLine> { self.lines.iter().find(|l| l.matches(key)) }

    /// Copy of the current lines, detached from later mutation.
    pub fn snapshot(&self) -> Vec<CartLine> { self.lines.clone() }

    /// Total number of units; always derived from the lines.
    pub fn count(&self) -> u64 { self.lines.iter().map(|l| u64::from(l.quantity)).sum() }

    /// Adds one unit of `line`, up to [`MAX_LINE_QUANTITY`]. The incoming quantity is ignored.
    pub fn add(&mut self, line: CartLine) -> u32 {
        match self.lines.iter_mut().find(|l| l.product_id == line.product_id && l.size == line.size && l.color == line.color) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(1).min(MAX_LINE_QUANTITY);
                existing.quantity
            }
            None => {
                self.lines.push(line.with_quantity(1));
                1
            }
        }
    }

    /// Removes the line for `key`. Returns false when there was nothing to remove.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !l.matches(key));
        self.lines.len() != before
    }

    /// Overwrites the quantity for `key`; anything at or below zero removes the line
    /// and anything above [`MAX_LINE_QUANTITY`] is clamped to it.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: i64) -> bool {
        if quantity <= 0 { return self.remove(key); }
        let quantity = u32::try_from(quantity).map_or(MAX_LINE_QUANTITY, |q| q.min(MAX_LINE_QUANTITY));
        match self.lines.iter_mut().find(|l| l.matches(key)) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) { self.lines.clear(); }

    /// Folds `local` into `remote`: shared keys sum their quantities (capped at
    /// [`MAX_LINE_QUANTITY`]), keys only in
    /// `local` are appended as-is, keys only in `remote` are untouched.
    pub fn merge(remote: &[CartLine], local: &[CartLine]) -> Self {
        let mut merged = Self::from_lines(remote.iter().cloned());
        for line in local.iter().filter(|l| l.quantity > 0) {
            merged.absorb(line.clone());
        }
        merged
    }

    fn absorb(&mut self, line: CartLine) {
        match self.lines.iter_mut().find(|l| l.product_id == line.product_id && l.size == line.size && l.color == line.color) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity).min(MAX_LINE_QUANTITY),
            None => {
                let quantity = line.quantity.min(MAX_LINE_QUANTITY);
                self.lines.push(line.with_quantity(quantity));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal::Decimal;

    pub(crate) fn line(id: u32, size: &str, color: &str, quantity: u32, price: i64) -> CartLine {
        CartLine {
            product_id: ProductId(id),
            size: size.into(),
            color: color.into(),
            quantity,
            unit_price: Money::inr(Decimal::new(price, 0)),
            display_name: format!("StandEase insole {id}"),
            image_ref: format!("/images/{id}.png"),
        }
    }

    #[test]
    fn test_add_keeps_one_line_per_key() {
        let mut cart = Cart::new();
        cart.add(line(1, "M", "black", 7, 10));
        cart.add(line(1, "M", "black", 1, 10));
        cart.add(line(1, "L", "black", 1, 10));
        cart.add(line(2, "M", "black", 1, 12));
        cart.add(line(1, "M", "grey", 1, 10));
        cart.add(line(1, "M", "black", 1, 10));
        assert_eq!(cart.lines().len(), 4);
        assert_eq!(cart.find(&LineKey::new(ProductId(1), "M", "black")).unwrap().quantity, 3);
        assert_eq!(cart.count(), 6);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(line(1, "M", "black", 1, 10));
        assert!(!cart.remove(&LineKey::new(ProductId(9), "M", "black")));
        assert_eq!(cart.count(), 1);
        assert!(cart.remove(&LineKey::new(ProductId(1), "M", "black")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let key = LineKey::new(ProductId(1), "M", "black");
        let mut cart = Cart::new();
        cart.add(line(1, "M", "black", 1, 10));
        assert!(cart.set_quantity(&key, 4));
        assert_eq!(cart.count(), 4);
        assert!(cart.set_quantity(&key, -2));
        assert!(cart.find(&key).is_none());
        cart.add(line(1, "M", "black", 1, 10));
        cart.set_quantity(&key, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merge_sums_shared_keys() {
        let remote = vec![line(1, "M", "black", 2, 10), line(2, "S", "blue", 1, 15)];
        let local = vec![line(1, "M", "black", 3, 10), line(3, "L", "red", 4, 20)];
        let merged = Cart::merge(&remote, &local);
        assert_eq!(merged.lines().len(), 3);
        assert_eq!(merged.find(&LineKey::new(ProductId(1), "M", "black")).unwrap().quantity, 5);
        assert_eq!(merged.find(&LineKey::new(ProductId(2), "S", "blue")), Some(&remote[1]));
        assert_eq!(merged.find(&LineKey::new(ProductId(3), "L", "red")), Some(&local[1]));
        assert_eq!(merged.count(), 10);
    }

    #[test]
    fn test_from_lines_coalesces_malformed_documents() {
        let cart = Cart::from_lines(vec![line(1, "M", "black", 2, 10), line(1, "M", "black", 1, 10), line(2, "M", "black", 0, 10)]);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_huge_quantities_are_clamped_per_line() {
        let first = LineKey::new(ProductId(1), "M", "black");
        let second = LineKey::new(ProductId(2), "L", "tan");
        let mut cart = Cart::new();
        cart.add(line(1, "M", "black", 1, 10));
        cart.add(line(2, "L", "tan", 1, 10));

        assert!(cart.set_quantity(&first, i64::from(u32::MAX)));
        assert!(cart.set_quantity(&second, i64::MAX));
        assert_eq!(cart.find(&first).unwrap().quantity, MAX_LINE_QUANTITY);
        assert_eq!(cart.count(), 2 * u64::from(MAX_LINE_QUANTITY));

        cart.add(line(1, "M", "black", 1, 10));
        assert_eq!(cart.find(&first).unwrap().quantity, MAX_LINE_QUANTITY);

        let merged = Cart::merge(&[line(1, "M", "black", 90, 10)], &[line(1, "M", "black", 90, 10), line(3, "S", "red", u32::MAX, 5)]);
        assert_eq!(merged.count(), 2 * u64::from(MAX_LINE_QUANTITY));
    }

    #[test]
    fn test_price_must_be_positive_and_bounded() {
        assert!(line(1, "M", "black", 1, 10).check_price().is_ok());
        for bad in [line(1, "M", "black", 1, 0), line(1, "M", "black", 1, -5)] {
            let err = bad.check_price().unwrap_err();
            assert_eq!(err.fields["unit_price"], "Price must be greater than zero");
        }
        let mut absurd = line(1, "M", "black", 1, 10);
        absurd.unit_price = Money::inr(Decimal::MAX);
        assert_eq!(absurd.check_price().unwrap_err().fields["unit_price"], "Price is out of range");
    }
}
