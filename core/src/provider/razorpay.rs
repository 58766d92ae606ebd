// coursecart/src/provider/razorpay.rs

use super::{PaymentGateway, PaymentRequest, ProviderEventSink};
use crate::config::ClientConfig;
use crate::error::{CheckoutError, Result};
use crate::model::Paise;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::OnceCell;
use tracing::{event, instrument, Level};

/// The host-side Razorpay checkout library.
///
/// In a browser this injects `checkout.js` and calls `new Razorpay(options)`;
/// the implementation wires the SDK's `handler` callback to
/// [`ProviderEventSink::succeeded`], its `payment.failed` event to
/// [`ProviderEventSink::failed`] and `modal.ondismiss` to
/// [`ProviderEventSink::dismissed`].
#[async_trait]
pub trait CheckoutSdk: Send + Sync {
  /// Loads the script at `src`, resolving `true` on load and `false` on error.
  async fn load_script(&self, src: &str) -> bool;

  fn open(&self, options: RazorpayOptions, sink: ProviderEventSink) -> std::result::Result<(), String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RazorpayPrefill {
  pub name: String,
  pub email: String,
  pub contact: String,
}

/// Options passed to the Razorpay constructor. `amount` is in paise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RazorpayOptions {
  pub key: String,
  pub amount: Paise,
  pub currency: String,
  pub name: String,
  pub description: String,
  pub prefill: RazorpayPrefill,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub notes: BTreeMap<String, String>,
}

pub struct RazorpayGateway<S: CheckoutSdk> {
  sdk: S,
  key_id: String,
  script_url: String,
  brand_name: String,
  currency: String,
  loaded: OnceCell<()>,
}

impl<S: CheckoutSdk> RazorpayGateway<S> {
  /// Fails with `CheckoutError::Config` when no Razorpay key is configured.
  pub fn new(sdk: S, config: &ClientConfig) -> Result<Self> {
    Ok(Self {
      sdk,
      key_id: config.require_razorpay_key()?.to_string(),
      script_url: config.razorpay_script_url.clone(),
      brand_name: config.brand_name.clone(),
      currency: config.currency.clone(),
      loaded: OnceCell::new(),
    })
  }

  pub fn sdk(&self) -> &S {
    &self.sdk
  }

  pub fn options_for(&self, request: &PaymentRequest) -> RazorpayOptions {
    RazorpayOptions {
      key: self.key_id.clone(),
      amount: request.amount.to_paise(),
      currency: self.currency.clone(),
      name: self.brand_name.clone(),
      description: request.description.clone(),
      prefill: RazorpayPrefill {
        name: request.customer.name.clone(),
        email: request.customer.email.clone(),
        contact: request.customer.contact.clone(),
      },
      notes: request.notes.clone(),
    }
  }
}

#[async_trait]
impl<S: CheckoutSdk> PaymentGateway for RazorpayGateway<S> {
  fn name(&self) -> &'static str {
    "razorpay"
  }

  /// Concurrent callers share one load. A failed load is not cached, so the
  /// next checkout attempt tries again.
  #[instrument(name = "RazorpayGateway::load", skip(self), fields(src = %self.script_url))]
  async fn load(&self) -> bool {
    let result = self
      .loaded
      .get_or_try_init(|| async {
        if self.sdk.load_script(&self.script_url).await {
          event!(Level::INFO, "Razorpay checkout script loaded.");
          Ok(())
        } else {
          Err(())
        }
      })
      .await;
    if result.is_err() {
      event!(Level::ERROR, "Razorpay checkout script failed to load.");
    }
    result.is_ok()
  }

  #[instrument(name = "RazorpayGateway::open", skip_all, fields(amount = %request.amount))]
  async fn open(&self, request: &PaymentRequest, sink: ProviderEventSink) -> Result<()> {
    if !self.load().await {
      return Err(CheckoutError::Provider(
        "Payment gateway failed to load. Please check your connection and try again.".to_string(),
      ));
    }
    let options = self.options_for(request);
    event!(Level::DEBUG, paise = options.amount.0, "Opening Razorpay checkout.");
    self.sdk.open(options, sink).map_err(CheckoutError::Provider)
  }
}
