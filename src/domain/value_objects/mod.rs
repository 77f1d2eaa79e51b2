//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Catalog product identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u32);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Identity issued by the identity provider
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Order document identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn generate() -> Self { Self(Uuid::now_v7()) }
    pub fn from_uuid(id: Uuid) -> Self { Self(id) }
    pub fn as_uuid(&self) -> Uuid { self.0 }

    /// Parses a client supplied id. Malformed ids simply never match an order.
    pub fn parse(value: &str) -> Option<Self> { Uuid::parse_str(value).ok().map(Self) }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Identity key of a cart line: at most one line per key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
}

impl LineKey {
    pub fn new(product_id: ProductId, size: impl Into<String>, color: impl Into<String>) -> Self {
        Self { product_id, size: size.into(), color: color.into() }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.product_id, self.size, self.color)
    }
}

/// How the customer pays for an order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery
    #[default]
    Cod,
    Upi,
    Card,
}

impl PaymentMethod {
    /// Online methods go through the payment gateway before the order is written.
    pub fn is_online(self) -> bool { !matches!(self, Self::Cod) }

    pub fn as_str(self) -> &'static str {
        match self { Self::Cod => "cod", Self::Upi => "upi", Self::Card => "card" }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "upi" => Ok(Self::Upi),
            "card" => Ok(Self::Card),
            other => Err(UnknownPaymentMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

/// The one email rule for sign-up and checkout: well formed per `validator`
/// and a dotted domain, so `a@localhost` is refused.
pub fn is_valid_email(email: &str) -> bool {
    validator::validate_email(email)
        && email
            .rsplit_once('@')
            .is_some_and(|(_, domain)| domain.split('.').count() >= 2 && domain.split('.').all(|part| !part.is_empty()))
}

/// Field-level messages for rejected input. Never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, thiserror::Error)]
#[error("invalid input: {}", .fields.keys().cloned().collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
    pub fields: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(fields: BTreeMap<String, String>) -> Self { Self { fields } }

    pub fn field(name: &str, message: impl Into<String>) -> Self {
        Self { fields: BTreeMap::from([(name.to_string(), message.into())]) }
    }
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn inr(amount: Decimal) -> Self { Self::new(amount, "INR") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_zero(&self) -> bool { self.amount.is_zero() }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch { expected: self.currency.clone(), found: other.currency.clone() });
        }
        let amount = self.amount.checked_add(other.amount).ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Result<Money, MoneyError> {
        let amount = self.amount.checked_mul(Decimal::from(qty)).ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, &self.currency))
    }
}

impl Default for Money { fn default() -> Self { Self::zero("INR") } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.amount.round_dp(2))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: String, found: String },
    #[error("amount out of range")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_rule() {
        assert!(is_valid_email("asha@example.com"));
        assert!(is_valid_email("asha.rao+orders@mail.example.in"));
        for bad in ["asha", "a@localhost", "a b@example.com", "a@example.", "@example.com", "a@@example.com"] {
            assert!(!is_valid_email(bad), "{bad} accepted");
        }
    }

    #[test]
    fn test_money_add() {
        let a = Money::inr(Decimal::new(100, 0));
        let b = Money::inr(Decimal::new(50, 0));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let a = Money::inr(Decimal::ONE);
        let b = Money::new(Decimal::ONE, "USD");
        assert!(matches!(a.add(&b), Err(MoneyError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_money_overflow_is_an_error() {
        let max = Money::inr(Decimal::MAX);
        assert_eq!(max.multiply(2), Err(MoneyError::Overflow));
        assert_eq!(max.add(&Money::inr(Decimal::MAX)), Err(MoneyError::Overflow));
        assert_eq!(Money::inr(Decimal::new(1250, 2)).multiply(3).unwrap().amount(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Upi).unwrap(), "\"upi\"");
        assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());
        assert!(!PaymentMethod::Cod.is_online());
        assert!(PaymentMethod::Card.is_online());
    }

    #[test]
    fn test_order_id_parse_rejects_garbage() {
        assert!(OrderId::parse("not-an-id").is_none());
        let id = OrderId::generate();
        assert_eq!(OrderId::parse(&id.to_string()), Some(id));
    }
}
