use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use coursecart::api::{Ack, CouponValidation, CourseApi, DetailsUpdate};
use coursecart::model::{Course, CourseRef, CourseType, PurchaseRecordRequest, UpiPurchaseRequest, User};
use coursecart::navigation::{Navigator, Route};
use coursecart::provider::{CheckoutSdk, PaymentConfirmation, ProviderEventSink, RazorpayOptions};
use coursecart::session::{SessionStore, SessionTokens};
use coursecart::{ApiError, CheckoutOrchestrator, ClientConfig, MountGuard, RazorpayGateway, Selection};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

// --- Fakes: every call answers immediately so only crate overhead is measured ---
struct InstantApi {
  course: Course,
}

#[async_trait]
impl CourseApi for InstantApi {
  async fn faculty_courses(&self, _faculty_slug: &str) -> Result<Vec<Course>, ApiError> {
    Ok(vec![self.course.clone()])
  }

  async fn course_details(&self, _course_id: &str, _course_type: CourseType) -> Result<Course, ApiError> {
    Ok(self.course.clone())
  }

  async fn validate_coupon(&self, _code: &str) -> Result<CouponValidation, ApiError> {
    Ok(CouponValidation {
      discount_percent: 10.0,
      message: None,
    })
  }

  async fn save_checkout_details(&self, _user_id: &str, _details: &DetailsUpdate) -> Result<(), ApiError> {
    Ok(())
  }

  async fn record_purchase(&self, _request: &PurchaseRecordRequest) -> Result<Ack, ApiError> {
    Ok(Ack {
      success: true,
      message: None,
    })
  }

  async fn record_upi_purchase(&self, _request: &UpiPurchaseRequest) -> Result<Ack, ApiError> {
    Ok(Ack {
      success: true,
      message: None,
    })
  }

  async fn check_purchase(&self, _user_id: &str, _faculty_slug: &str, _course_index: usize) -> Result<bool, ApiError> {
    Ok(false)
  }
}

struct InstantSdk;

#[async_trait]
impl CheckoutSdk for InstantSdk {
  async fn load_script(&self, _src: &str) -> bool {
    true
  }

  fn open(&self, _options: RazorpayOptions, sink: ProviderEventSink) -> Result<(), String> {
    sink.succeeded(PaymentConfirmation {
      payment_id: "pay_bench".to_string(),
      order_id: None,
      signature: None,
    });
    Ok(())
  }
}

struct NullNavigator;

impl Navigator for NullNavigator {
  fn navigate(&self, _route: Route) {}
}

/// A tiered course with `modes` modes of `attempts` attempts each.
fn course_with(modes: usize, attempts: usize) -> Course {
  let pricing: Vec<_> = (0..modes)
    .map(|m| {
      let tiers: Vec<_> = (0..attempts)
        .map(|a| {
          serde_json::json!({
            "attempt": format!("Attempt {}", a),
            "costPrice": 10_000 + a * 500,
            "sellingPrice": 9_000 + a * 450,
          })
        })
        .collect();
      serde_json::json!({ "mode": format!("Mode {}", m), "attempts": tiers })
    })
    .collect();
  serde_json::from_value(serde_json::json!({
    "_id": "bench-course",
    "title": "Bench Course",
    "facultySlug": "bench-faculty",
    "modeAttemptPricing": pricing,
  }))
  .unwrap()
}

fn signed_in() -> Arc<SessionStore> {
  let session = Arc::new(SessionStore::new());
  session.sign_in(
    SessionTokens {
      access_token: "bench".to_string(),
      refresh_token: None,
      is_admin: false,
    },
    User::new("bench-user", "Bench Student", "bench@example.com", "9000000000"),
  );
  session
}

// --- Benchmark Functions ---

fn bench_pricing_resolution(c: &mut Criterion) {
  let mut group = c.benchmark_group("PricingResolution");
  for size in [2usize, 8, 32].iter() {
    let course = course_with(*size, *size);
    let last_mode = format!("Mode {}", size - 1);
    let last_attempt = format!("Attempt {}", size - 1);
    group.throughput(Throughput::Elements(1));
    group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
      b.iter(|| {
        let mut selection = Selection::default_for(&course);
        selection.select_mode(&course, &last_mode);
        selection.select_attempt(&course, &last_attempt);
        selection.price()
      })
    });
  }
  group.finish();
}

fn bench_checkout_run(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let course = course_with(2, 2);
  let course_ref = CourseRef::for_faculty_course(&course, "bench-faculty", 0);
  let selection = Selection::default_for(&course);
  let config = Arc::new(
    ClientConfig::new("http://bench.invalid/api")
      .with_razorpay_key("rzp_bench")
      .with_upi_payee("bench@upi", "Bench")
      .with_redirect_delay(Duration::ZERO),
  );
  let api: Arc<dyn CourseApi> = Arc::new(InstantApi { course });
  let gateway = Arc::new(RazorpayGateway::new(InstantSdk, &config).unwrap());
  let session = signed_in();

  let mut group = c.benchmark_group("CheckoutRun");
  group.throughput(Throughput::Elements(1));
  for method in ["razorpay", "upi"] {
    group.bench_function(method, |b| {
      b.to_async(&rt).iter_batched(
        || {
          CheckoutOrchestrator::new(
            api.clone(),
            gateway.clone(),
            Arc::new(NullNavigator),
            session.clone(),
            config.clone(),
            MountGuard::new(),
          )
          .unwrap()
        },
        |orchestrator| {
          let course_ref = course_ref.clone();
          let selection = selection.clone();
          async move {
            orchestrator.buy_now(&course_ref, &selection, None).unwrap();
            let receipt = if method == "upi" {
              orchestrator.pay_with_upi("412345678901").await
            } else {
              orchestrator.pay_with_razorpay().await
            };
            receipt.unwrap()
          }
        },
        criterion::BatchSize::SmallInput,
      )
    });
  }
  group.finish();
}

criterion_group!(benches, bench_pricing_resolution, bench_checkout_run);
criterion_main!(benches);
