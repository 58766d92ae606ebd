// tests/provider_tests.rs
mod common;

use common::*;
use coursecart::model::Rupees;
use coursecart::provider::{Customer, PaymentGateway, PaymentRequest, ProviderEvent, ProviderEventSink, RazorpayGateway};
use coursecart::{CheckoutError, ClientConfig};
use serial_test::serial;
use std::collections::BTreeMap;
use std::sync::Arc;

fn request(amount: u64) -> PaymentRequest {
  let mut notes = BTreeMap::new();
  notes.insert("mode".to_string(), "Live at Home".to_string());
  PaymentRequest {
    amount: Rupees(amount),
    description: "CA Final Financial Reporting".to_string(),
    customer: Customer {
      name: "Asha Verma".to_string(),
      email: "asha@example.com".to_string(),
      contact: "9876543210".to_string(),
    },
    notes,
  }
}

#[tokio::test]
#[serial]
async fn test_sink_settles_on_first_event_only() {
  setup_tracing();
  let (sink, events) = ProviderEventSink::channel();
  let late = sink.clone();

  assert!(!sink.is_settled());
  assert!(sink.succeeded(confirmation("pay_1")));
  assert!(late.is_settled());
  assert!(!late.succeeded(confirmation("pay_2")));
  assert!(!late.failed("BAD_REQUEST_ERROR", "late failure"));
  assert!(!late.dismissed());

  assert_eq!(events.outcome().await, ProviderEvent::Succeeded(confirmation("pay_1")));
}

#[tokio::test]
#[serial]
async fn test_dropped_sink_counts_as_failure() {
  setup_tracing();
  let (sink, events) = ProviderEventSink::channel();
  drop(sink);

  match events.outcome().await {
    ProviderEvent::Failed { code, .. } => assert_eq!(code, "PROVIDER_CLOSED"),
    other => panic!("expected failure, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_concurrent_loads_share_one_script_load() {
  setup_tracing();
  let gateway = Arc::new(RazorpayGateway::new(FakeSdk::new(SdkBehavior::Succeed), &test_config()).unwrap());

  let loads = (0..4).map(|_| {
    let gateway = gateway.clone();
    async move { gateway.load().await }
  });
  let results = futures_util::future::join_all(loads).await;

  assert!(results.into_iter().all(|ok| ok));
  assert_eq!(FakeApi::calls(&gateway.sdk().load_calls), 1);
  assert!(gateway.load().await);
  assert_eq!(FakeApi::calls(&gateway.sdk().load_calls), 1);
}

#[tokio::test]
#[serial]
async fn test_failed_load_is_retried_and_blocks_open() {
  setup_tracing();
  let gateway = RazorpayGateway::new(FakeSdk::broken_script(), &test_config()).unwrap();
  let (sink, _events) = ProviderEventSink::channel();

  assert!(!gateway.load().await);
  let err = gateway.open(&request(100), sink).await.unwrap_err();
  assert!(matches!(err, CheckoutError::Provider(ref m) if m.contains("failed to load")));
  assert_eq!(FakeApi::calls(&gateway.sdk().load_calls), 2);
  assert!(gateway.sdk().opened.lock().is_empty());
}

#[tokio::test]
#[serial]
async fn test_options_carry_paise_and_prefill() {
  setup_tracing();
  let gateway = RazorpayGateway::new(FakeSdk::new(SdkBehavior::Succeed), &test_config()).unwrap();
  let options = gateway.options_for(&request(13999));

  assert_eq!(options.key, "rzp_test_key");
  assert_eq!(options.amount.0, 1_399_900);
  assert_eq!(options.currency, "INR");
  assert_eq!(options.prefill.contact, "9876543210");

  let json = serde_json::to_value(&options).unwrap();
  assert_eq!(json["amount"], 1_399_900);
  assert_eq!(json["notes"]["mode"], "Live at Home");
  assert_eq!(json["prefill"]["email"], "asha@example.com");
}

#[tokio::test]
#[serial]
async fn test_popup_error_surfaces_as_provider_error() {
  setup_tracing();
  let gateway = RazorpayGateway::new(FakeSdk::new(SdkBehavior::PopupBlocked), &test_config()).unwrap();
  let (sink, _events) = ProviderEventSink::channel();

  let err = gateway.open(&request(500), sink).await.unwrap_err();
  assert_eq!(err.user_message(), "Payment failed: Popup blocked by the browser");
}

#[test]
fn test_gateway_requires_a_key() {
  let config = ClientConfig::new("http://api.test/api");
  assert!(matches!(
    RazorpayGateway::new(FakeSdk::new(SdkBehavior::Succeed), &config),
    Err(CheckoutError::Config(_))
  ));
}
