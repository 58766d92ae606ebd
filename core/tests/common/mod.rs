// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use coursecart::api::{Ack, CouponValidation, CourseApi, DetailsUpdate};
use coursecart::model::{Course, CourseRef, CourseType, PurchaseRecordRequest, UpiPurchaseRequest, User};
use coursecart::navigation::{Navigator, Route};
use coursecart::provider::{CheckoutSdk, PaymentConfirmation, RazorpayGateway, RazorpayOptions, ProviderEventSink};
use coursecart::session::{SessionStore, SessionTokens};
use coursecart::{ApiError, CheckoutOrchestrator, ClientConfig, MountGuard};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::Level;

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---
pub const FACULTY_SLUG: &str = "rahul-sir";

/// Two modes; "Live at Home" / "12 Months" is 15999 listed, 13999 selling.
pub fn tiered_course() -> Course {
  serde_json::from_value(serde_json::json!({
    "_id": "course-fr-01",
    "title": "CA Final Financial Reporting",
    "subject": "Financial Reporting",
    "category": "CA",
    "subcategory": "Final",
    "facultySlug": FACULTY_SLUG,
    "modeAttemptPricing": [
      {
        "mode": "Live at Home",
        "attempts": [
          { "attempt": "12 Months", "costPrice": 15999, "sellingPrice": 13999 },
          { "attempt": "6 Months", "costPrice": 9999, "sellingPrice": 8999 }
        ]
      },
      {
        "mode": "Recorded Videos",
        "attempts": [
          { "attempt": "Nov 2025", "costPrice": "7999", "sellingPrice": 6499.0 }
        ]
      }
    ]
  }))
  .expect("tiered course fixture decodes")
}

/// Flat pricing: every mode × duration costs 12000 / 9999.
pub fn legacy_course() -> Course {
  serde_json::from_value(serde_json::json!({
    "_id": "course-audit-02",
    "subject": "Audit",
    "category": "cma",
    "subcategory": "Intermediate",
    "modes": ["Pendrive", "Google Drive"],
    "durations": ["May 2025", "Nov 2025"],
    "costPrice": 12000,
    "sellingPrice": 9999
  }))
  .expect("legacy course fixture decodes")
}

pub fn tiered_course_ref() -> CourseRef {
  CourseRef::for_faculty_course(&tiered_course(), FACULTY_SLUG, 0)
}

pub fn student() -> User {
  User::new("user-42", "Asha Verma", "asha@example.com", "9876543210")
}

pub fn signed_in_session() -> Arc<SessionStore> {
  let session = Arc::new(SessionStore::new());
  session.sign_in(
    SessionTokens {
      access_token: "access-1".to_string(),
      refresh_token: Some("refresh-1".to_string()),
      is_admin: false,
    },
    student(),
  );
  session
}

pub fn test_config() -> ClientConfig {
  ClientConfig::new("http://api.test/api")
    .with_razorpay_key("rzp_test_key")
    .with_upi_payee("coaching@okaxis", "Exam Prep Courses")
    .with_redirect_delay(Duration::from_secs(3))
}

// --- Fake API ---
#[derive(Default)]
pub struct FakeApi {
  pub courses: Mutex<Vec<Course>>,
  pub details: Mutex<Option<Course>>,
  pub coupons: Mutex<HashMap<String, f64>>,
  pub coupon_error: Mutex<Option<ApiError>>,
  pub record_error: Mutex<Option<ApiError>>,
  pub upi_error: Mutex<Option<ApiError>>,
  pub save_error: Mutex<Option<ApiError>>,
  pub purchased: Mutex<HashSet<usize>>,
  pub failing_indices: Mutex<HashSet<usize>>,
  /// When set, `faculty_courses` waits for a permit before answering.
  pub course_gate: Mutex<Option<Arc<Notify>>>,

  pub coupon_calls: AtomicUsize,
  pub record_calls: AtomicUsize,
  pub upi_calls: AtomicUsize,
  pub save_calls: AtomicUsize,
  pub check_calls: AtomicUsize,

  pub recorded: Mutex<Vec<PurchaseRecordRequest>>,
  pub upi_submissions: Mutex<Vec<UpiPurchaseRequest>>,
  pub saved_details: Mutex<Vec<DetailsUpdate>>,
  pub coupon_codes_seen: Mutex<Vec<String>>,
}

impl FakeApi {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn with_courses(courses: Vec<Course>) -> Arc<Self> {
    let api = Self::default();
    *api.courses.lock() = courses;
    Arc::new(api)
  }

  pub fn add_coupon(&self, code: &str, percent: f64) {
    self.coupons.lock().insert(code.to_string(), percent);
  }

  pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl CourseApi for FakeApi {
  async fn faculty_courses(&self, _faculty_slug: &str) -> Result<Vec<Course>, ApiError> {
    let gate = self.course_gate.lock().clone();
    if let Some(gate) = gate {
      gate.notified().await;
    }
    Ok(self.courses.lock().clone())
  }

  async fn course_details(&self, _course_id: &str, _course_type: CourseType) -> Result<Course, ApiError> {
    self.details.lock().clone().ok_or(ApiError::Status {
      status: 404,
      message: "Course not found".to_string(),
    })
  }

  async fn validate_coupon(&self, code: &str) -> Result<CouponValidation, ApiError> {
    self.coupon_calls.fetch_add(1, Ordering::SeqCst);
    self.coupon_codes_seen.lock().push(code.to_string());
    if let Some(err) = self.coupon_error.lock().clone() {
      return Err(err);
    }
    match self.coupons.lock().get(code) {
      Some(percent) => Ok(CouponValidation {
        discount_percent: *percent,
        message: None,
      }),
      None => Err(ApiError::Status {
        status: 404,
        message: "Invalid or expired coupon".to_string(),
      }),
    }
  }

  async fn save_checkout_details(&self, _user_id: &str, details: &DetailsUpdate) -> Result<(), ApiError> {
    self.save_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(err) = self.save_error.lock().clone() {
      return Err(err);
    }
    self.saved_details.lock().push(details.clone());
    Ok(())
  }

  async fn record_purchase(&self, request: &PurchaseRecordRequest) -> Result<Ack, ApiError> {
    self.record_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(err) = self.record_error.lock().clone() {
      return Err(err);
    }
    self.recorded.lock().push(request.clone());
    Ok(Ack {
      success: true,
      message: Some("Course purchased successfully".to_string()),
    })
  }

  async fn record_upi_purchase(&self, request: &UpiPurchaseRequest) -> Result<Ack, ApiError> {
    self.upi_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(err) = self.upi_error.lock().clone() {
      return Err(err);
    }
    self.upi_submissions.lock().push(request.clone());
    Ok(Ack {
      success: true,
      message: None,
    })
  }

  async fn check_purchase(&self, _user_id: &str, _faculty_slug: &str, course_index: usize) -> Result<bool, ApiError> {
    self.check_calls.fetch_add(1, Ordering::SeqCst);
    if self.failing_indices.lock().contains(&course_index) {
      return Err(ApiError::Timeout);
    }
    Ok(self.purchased.lock().contains(&course_index))
  }
}

// --- Fake Razorpay SDK ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkBehavior {
  Succeed,
  /// The success callback fires twice for the same payment.
  SucceedTwice,
  Fail,
  Dismiss,
  /// Keep the sink so the test can fire events itself.
  Hold,
  PopupBlocked,
}

pub struct FakeSdk {
  pub behavior: Mutex<SdkBehavior>,
  pub script_loads: bool,
  pub load_calls: AtomicUsize,
  pub opened: Mutex<Vec<RazorpayOptions>>,
  pub held: Mutex<Option<ProviderEventSink>>,
}

impl FakeSdk {
  pub fn new(behavior: SdkBehavior) -> Self {
    Self {
      behavior: Mutex::new(behavior),
      script_loads: true,
      load_calls: AtomicUsize::new(0),
      opened: Mutex::new(Vec::new()),
      held: Mutex::new(None),
    }
  }

  pub fn broken_script() -> Self {
    Self {
      script_loads: false,
      ..Self::new(SdkBehavior::Succeed)
    }
  }

  pub fn set_behavior(&self, behavior: SdkBehavior) {
    *self.behavior.lock() = behavior;
  }

  pub fn held_sink(&self) -> Option<ProviderEventSink> {
    self.held.lock().clone()
  }
}

pub fn confirmation(payment_id: &str) -> PaymentConfirmation {
  PaymentConfirmation {
    payment_id: payment_id.to_string(),
    order_id: None,
    signature: None,
  }
}

#[async_trait]
impl CheckoutSdk for FakeSdk {
  async fn load_script(&self, _src: &str) -> bool {
    self.load_calls.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
    self.script_loads
  }

  fn open(&self, options: RazorpayOptions, sink: ProviderEventSink) -> Result<(), String> {
    self.opened.lock().push(options);
    match self.behavior.lock().clone() {
      SdkBehavior::Succeed => {
        sink.succeeded(confirmation("pay_123"));
      }
      SdkBehavior::SucceedTwice => {
        sink.succeeded(confirmation("pay_123"));
        sink.succeeded(confirmation("pay_123"));
      }
      SdkBehavior::Fail => {
        sink.failed("BAD_REQUEST_ERROR", "Card declined by issuer");
      }
      SdkBehavior::Dismiss => {
        sink.dismissed();
      }
      SdkBehavior::Hold => {
        *self.held.lock() = Some(sink);
      }
      SdkBehavior::PopupBlocked => return Err("Popup blocked by the browser".to_string()),
    }
    Ok(())
  }
}

// --- Navigation ---
#[derive(Default)]
pub struct RecordingNavigator {
  pub routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
  pub fn routes(&self) -> Vec<Route> {
    self.routes.lock().clone()
  }

  pub fn dashboard_visits(&self) -> usize {
    self.routes.lock().iter().filter(|r| **r == Route::Dashboard).count()
  }
}

impl Navigator for RecordingNavigator {
  fn navigate(&self, route: Route) {
    self.routes.lock().push(route);
  }
}

// --- Checkout harness ---
pub struct Harness {
  pub api: Arc<FakeApi>,
  pub gateway: Arc<RazorpayGateway<FakeSdk>>,
  pub navigator: Arc<RecordingNavigator>,
  pub session: Arc<SessionStore>,
  pub mount: MountGuard,
  pub orchestrator: Arc<CheckoutOrchestrator>,
}

impl Harness {
  pub fn new(session: Arc<SessionStore>, sdk: FakeSdk) -> Self {
    let api = FakeApi::new();
    let config = test_config();
    let gateway = Arc::new(RazorpayGateway::new(sdk, &config).expect("gateway builds with a key"));
    let navigator = Arc::new(RecordingNavigator::default());
    let mount = MountGuard::new();
    let orchestrator = CheckoutOrchestrator::new(
      api.clone(),
      gateway.clone(),
      navigator.clone(),
      session.clone(),
      Arc::new(config),
      mount.clone(),
    )
    .expect("checkout pipeline builds");
    Self {
      api,
      gateway,
      navigator,
      session,
      mount,
      orchestrator: Arc::new(orchestrator),
    }
  }

  pub fn signed_in(sdk: FakeSdk) -> Self {
    Self::new(signed_in_session(), sdk)
  }

  pub fn sdk(&self) -> &FakeSdk {
    self.gateway.sdk()
  }
}
