//! Order submission state machine and the simulated payment step.
//!
//! ```text
//! Idle ──try_begin──▶ Submitting ──place──▶ Placed   (terminal)
//!                          │
//!                          └────fail────▶ Failed    (retry as from Idle)
//! ```

use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Money, OrderId};

pub const PAYMENT_DECLINED: &str = "Payment failed. Please try again.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Placed { order_id: OrderId },
    Failed { reason: String },
}

/// Guards a checkout against overlapping submissions.
pub struct OrderSubmission {
    state: Mutex<SubmissionState>,
}

impl Default for OrderSubmission {
    fn default() -> Self { Self { state: Mutex::new(SubmissionState::Idle) } }
}

impl OrderSubmission {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self) -> SubmissionState { self.lock().clone() }

    /// Enters `Submitting` from `Idle` or `Failed`. False while a submission is
    /// in flight or after the order was placed.
    pub fn try_begin(&self) -> bool {
        let mut state = self.lock();
        match *state {
            SubmissionState::Idle | SubmissionState::Failed { .. } => {
                *state = SubmissionState::Submitting;
                true
            }
            SubmissionState::Submitting | SubmissionState::Placed { .. } => false,
        }
    }

    pub fn place(&self, order_id: OrderId) {
        let mut state = self.lock();
        debug_assert_eq!(*state, SubmissionState::Submitting);
        *state = SubmissionState::Placed { order_id };
    }

    pub fn fail(&self, reason: impl Into<String>) {
        let mut state = self.lock();
        debug_assert_eq!(*state, SubmissionState::Submitting);
        *state = SubmissionState::Failed { reason: reason.into() };
    }

    /// Back to `Idle` for a fresh checkout. Ignored while submitting.
    pub fn reset(&self) -> bool {
        let mut state = self.lock();
        if *state == SubmissionState::Submitting { return false; }
        *state = SubmissionState::Idle;
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SubmissionState> {
        self.state.lock().expect("submission lock poisoned")
    }
}

/// Result the shopper picks on the simulated payment screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    #[default]
    Success,
    Failure,
}

/// Stand-in for a payment provider: waits, then reports the requested outcome.
#[derive(Clone, Debug)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self { Self { delay } }

    pub async fn charge(&self, amount: &Money, outcome: PaymentOutcome) -> Result<(), &'static str> {
        tracing::debug!(%amount, delay_ms = self.delay.as_millis() as u64, "processing simulated payment");
        tokio::time::sleep(self.delay).await;
        match outcome {
            PaymentOutcome::Success => Ok(()),
            PaymentOutcome::Failure => Err(PAYMENT_DECLINED),
        }
    }
}

/// Navigation scheduled after a successful order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub to: &'static str,
    pub after_ms: u64,
}

impl Redirect {
    pub fn to_orders(after: Duration) -> Self { Self { to: "/orders", after_ms: after.as_millis() as u64 } }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Placed { order_id: OrderId, total: Money, redirect: Redirect },
    /// Another submission is already in flight, or this checkout already completed.
    Ignored,
    Failed { reason: String },
}
