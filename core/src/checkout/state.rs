// coursecart/src/checkout/state.rs

use crate::error::{CheckoutError, Result};
use std::fmt;
use tracing::{event, Level};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CheckoutState {
  #[default]
  Idle,
  DetailsCollection,
  PaymentPending,
  PaymentSuccess,
  /// Not terminal: the student can edit details and pay again.
  PaymentFailed,
}

impl CheckoutState {
  pub fn as_str(self) -> &'static str {
    match self {
      CheckoutState::Idle => "idle",
      CheckoutState::DetailsCollection => "collecting details",
      CheckoutState::PaymentPending => "awaiting payment",
      CheckoutState::PaymentSuccess => "paid",
      CheckoutState::PaymentFailed => "failed",
    }
  }

  /// Details can be edited and a payment started.
  pub fn accepts_payment(self) -> bool {
    matches!(self, CheckoutState::DetailsCollection | CheckoutState::PaymentFailed)
  }
}

impl fmt::Display for CheckoutState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutEvent {
  /// "Buy Now" passed its guards.
  Begin,
  /// Details are valid and a payment is starting.
  Submit,
  /// The provider confirmed and the purchase was recorded.
  Recorded,
  Fail,
  /// The checkout panel was closed.
  Close,
}

impl CheckoutEvent {
  fn as_str(self) -> &'static str {
    match self {
      CheckoutEvent::Begin => "begin checkout",
      CheckoutEvent::Submit => "start payment",
      CheckoutEvent::Recorded => "complete purchase",
      CheckoutEvent::Fail => "fail payment",
      CheckoutEvent::Close => "close checkout",
    }
  }
}

/// The checkout state plus the `processing` lock that is held for exactly
/// as long as the machine sits in `PaymentPending`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutMachine {
  state: CheckoutState,
  processing: bool,
}

impl CheckoutMachine {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> CheckoutState {
    self.state
  }

  pub fn is_processing(&self) -> bool {
    self.processing
  }

  /// Applies `checkout_event`, returning the new state. Events that do not
  /// fit the current state leave it untouched: `Busy` while a payment is in
  /// flight, `InvalidTransition` otherwise.
  pub fn apply(&mut self, checkout_event: CheckoutEvent) -> Result<CheckoutState> {
    use CheckoutEvent::*;
    use CheckoutState::*;

    let next = match (self.state, checkout_event) {
      (Idle | DetailsCollection | PaymentFailed, Begin) => DetailsCollection,
      (DetailsCollection | PaymentFailed, Submit) => PaymentPending,
      (PaymentPending, Recorded) => PaymentSuccess,
      (PaymentPending, Fail) => PaymentFailed,
      (PaymentPending, Begin | Submit | Close) => return Err(CheckoutError::Busy),
      (_, Close) => Idle,
      (state, checkout_event) => {
        event!(Level::WARN, state = state.as_str(), checkout_event = checkout_event.as_str(), "Rejected checkout transition.");
        return Err(CheckoutError::InvalidTransition {
          action: checkout_event.as_str(),
          state: state.as_str(),
        });
      }
    };

    event!(Level::DEBUG, from = self.state.as_str(), to = next.as_str(), "Checkout transition.");
    self.state = next;
    self.processing = next == PaymentPending;
    Ok(next)
  }
}
