// coursecart/src/provider/mod.rs

//! Payment-provider adapter.
//!
//! A [`PaymentGateway`] is loaded lazily on the first checkout attempt and
//! then opened with a gateway-neutral [`PaymentRequest`]. Everything the
//! provider reports afterwards arrives through the [`ProviderEventSink`]
//! handed to `open`; the orchestrator treats the first event as the outcome
//! of the attempt.

pub mod razorpay;

pub use razorpay::{CheckoutSdk, RazorpayGateway, RazorpayOptions, RazorpayPrefill};

use crate::error::Result;
use crate::model::Rupees;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{event, Level};

/// Contact details the provider pre-fills in its form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
  pub name: String,
  pub email: String,
  pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
  /// Whole rupees. Gateways convert to their own unit.
  pub amount: Rupees,
  pub description: String,
  pub customer: Customer,
  pub notes: BTreeMap<String, String>,
}

/// A provider-side success, as handed to the success callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
  pub payment_id: String,
  pub order_id: Option<String>,
  pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
  Succeeded(PaymentConfirmation),
  Failed { code: String, description: String },
  /// The student closed the provider's popup without paying.
  Dismissed,
}

/// The one channel from a provider back to the orchestrator.
///
/// Clones share one slot: the first event settles it and every later event
/// (a second success callback, a failure after success) is logged and
/// dropped.
#[derive(Clone)]
pub struct ProviderEventSink {
  slot: Arc<Mutex<Option<oneshot::Sender<ProviderEvent>>>>,
}

/// The receiving end of a [`ProviderEventSink`].
pub struct ProviderEvents {
  rx: oneshot::Receiver<ProviderEvent>,
}

impl ProviderEventSink {
  pub fn channel() -> (ProviderEventSink, ProviderEvents) {
    let (tx, rx) = oneshot::channel();
    (
      ProviderEventSink {
        slot: Arc::new(Mutex::new(Some(tx))),
      },
      ProviderEvents { rx },
    )
  }

  /// Returns `false` when the sink had already settled.
  pub fn succeeded(&self, confirmation: PaymentConfirmation) -> bool {
    self.settle(ProviderEvent::Succeeded(confirmation))
  }

  pub fn failed(&self, code: impl Into<String>, description: impl Into<String>) -> bool {
    self.settle(ProviderEvent::Failed {
      code: code.into(),
      description: description.into(),
    })
  }

  pub fn dismissed(&self) -> bool {
    self.settle(ProviderEvent::Dismissed)
  }

  pub fn is_settled(&self) -> bool {
    self.slot.lock().is_none()
  }

  fn settle(&self, provider_event: ProviderEvent) -> bool {
    let Some(tx) = self.slot.lock().take() else {
      event!(Level::WARN, ?provider_event, "Provider event after settlement dropped.");
      return false;
    };
    event!(Level::DEBUG, ?provider_event, "Provider event received.");
    // The receiver may be gone when the checkout was torn down; nothing to do.
    tx.send(provider_event).is_ok()
  }
}

impl std::fmt::Debug for ProviderEventSink {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ProviderEventSink")
      .field("settled", &self.is_settled())
      .finish()
  }
}

impl ProviderEvents {
  /// Waits for the attempt's outcome. A provider that drops every sink
  /// without reporting counts as a failure.
  pub async fn outcome(self) -> ProviderEvent {
    match self.rx.await {
      Ok(provider_event) => provider_event,
      Err(_) => ProviderEvent::Failed {
        code: "PROVIDER_CLOSED".to_string(),
        description: "The payment window closed without a result".to_string(),
      },
    }
  }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn name(&self) -> &'static str;

  /// Loads the provider's client. Idempotent; `false` when it cannot be
  /// loaded.
  async fn load(&self) -> bool;

  /// Opens the provider's checkout. Returning `Ok` only means the popup is
  /// up; the outcome arrives through `sink`.
  async fn open(&self, request: &PaymentRequest, sink: ProviderEventSink) -> Result<()>;
}
