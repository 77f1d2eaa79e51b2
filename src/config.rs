//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `PORT` - Listen port (default: 8083)
//! - `DATABASE_URL` - Postgres connection string; in-memory store when unset
//! - `NATS_URL` - NATS server for domain events; events are logged when unset
//! - `GUEST_CART_DIR` - Directory for device-local guest carts; in-memory when unset
//! - `CURRENCY` - Catalog currency (default: INR)
//! - `FLAT_SHIPPING_FEE` - Shipping fee below the free threshold (default: 5.99)
//! - `FREE_SHIPPING_THRESHOLD` - Subtotals strictly above ship free (default: 50)
//! - `PAYMENT_DELAY_MS` - Simulated gateway delay (default: 1500)
//! - `ORDER_REDIRECT_DELAY_MS` - Confirmation display time before redirect (default: 2500)
//! - `CART_WRITE_MODE` - `strict` or `optimistic` (default: strict)
//! - `SESSION_IDLE_SECS` - Idle time before an unused session is evicted (default: 1800)
//! - `MAX_SESSIONS` - Upper bound on live sessions (default: 10000)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::aggregates::ShippingPolicy;
use crate::services::cart::CartWriteMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout behaviour shared by every session.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub shipping: ShippingPolicy,
    pub payment_delay: Duration,
    pub redirect_delay: Duration,
    pub cart_write_mode: CartWriteMode,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            shipping: ShippingPolicy::default(),
            payment_delay: Duration::from_millis(1500),
            redirect_delay: Duration::from_millis(2500),
            cart_write_mode: CartWriteMode::Strict,
        }
    }
}

/// Limits of the in-process session registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub idle_ttl: Duration,
    pub max_sessions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self { Self { idle_ttl: Duration::from_secs(1800), max_sessions: 10_000 } }
}

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub guest_cart_dir: Option<PathBuf>,
    pub checkout: CheckoutSettings,
    pub sessions: SessionSettings,
}

impl StorefrontConfig {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = CheckoutSettings::default();

        let currency = get("CURRENCY").unwrap_or_else(|| defaults.shipping.currency.clone());
        let shipping = ShippingPolicy {
            flat_fee: parse_or("FLAT_SHIPPING_FEE", get("FLAT_SHIPPING_FEE"), defaults.shipping.flat_fee)?,
            free_above: parse_or("FREE_SHIPPING_THRESHOLD", get("FREE_SHIPPING_THRESHOLD"), defaults.shipping.free_above)?,
            currency,
        };
        if shipping.flat_fee < Decimal::ZERO {
            return Err(ConfigError::InvalidEnvVar("FLAT_SHIPPING_FEE".into(), "must not be negative".into()));
        }

        let checkout = CheckoutSettings {
            shipping,
            payment_delay: Duration::from_millis(parse_or("PAYMENT_DELAY_MS", get("PAYMENT_DELAY_MS"), 1500u64)?),
            redirect_delay: Duration::from_millis(parse_or("ORDER_REDIRECT_DELAY_MS", get("ORDER_REDIRECT_DELAY_MS"), 2500u64)?),
            cart_write_mode: parse_or("CART_WRITE_MODE", get("CART_WRITE_MODE"), defaults.cart_write_mode)?,
        };

        let session_defaults = SessionSettings::default();
        let sessions = SessionSettings {
            idle_ttl: Duration::from_secs(parse_or("SESSION_IDLE_SECS", get("SESSION_IDLE_SECS"), session_defaults.idle_ttl.as_secs())?),
            max_sessions: parse_or("MAX_SESSIONS", get("MAX_SESSIONS"), session_defaults.max_sessions)?,
        };
        if sessions.max_sessions == 0 {
            return Err(ConfigError::InvalidEnvVar("MAX_SESSIONS".into(), "must be at least 1".into()));
        }

        Ok(Self {
            port: parse_or("PORT", get("PORT"), 8083u16)?,
            database_url: get("DATABASE_URL"),
            nats_url: get("NATS_URL"),
            guest_cart_dir: get("GUEST_CART_DIR").map(PathBuf::from),
            checkout,
            sessions,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
