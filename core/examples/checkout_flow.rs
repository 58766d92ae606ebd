// coursecart/examples/checkout_flow.rs

//! Walks one student through a faculty page: purchase statuses, a course
//! detail view with a coupon, and a Razorpay checkout that ends on the
//! dashboard. The REST API and the Razorpay SDK are in-memory stand-ins.

use async_trait::async_trait;
use coursecart::api::{Ack, CouponValidation, CourseApi, DetailsUpdate};
use coursecart::model::{Course, CourseType, PurchaseRecordRequest, UpiPurchaseRequest, User};
use coursecart::navigation::{Navigator, Route};
use coursecart::provider::{CheckoutSdk, PaymentConfirmation, ProviderEventSink, RazorpayOptions};
use coursecart::session::{SessionStore, SessionTokens};
use coursecart::{ApiError, CheckoutError, ClientConfig, CourseDetailView, PurchaseStatusReconciler, RazorpayGateway};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// --- In-memory API ---
struct DemoApi {
  courses: Vec<Course>,
  purchased: Mutex<Vec<usize>>,
}

#[async_trait]
impl CourseApi for DemoApi {
  async fn faculty_courses(&self, _faculty_slug: &str) -> Result<Vec<Course>, ApiError> {
    Ok(self.courses.clone())
  }

  async fn course_details(&self, course_id: &str, _course_type: CourseType) -> Result<Course, ApiError> {
    self
      .courses
      .iter()
      .find(|c| c.id.as_deref() == Some(course_id))
      .cloned()
      .ok_or(ApiError::Status {
        status: 404,
        message: "Course not found".to_string(),
      })
  }

  async fn validate_coupon(&self, code: &str) -> Result<CouponValidation, ApiError> {
    match code {
      "OFF10" => Ok(CouponValidation {
        discount_percent: 10.0,
        message: Some("10% off applied".to_string()),
      }),
      _ => Err(ApiError::Status {
        status: 404,
        message: "Invalid or expired coupon".to_string(),
      }),
    }
  }

  async fn save_checkout_details(&self, user_id: &str, details: &DetailsUpdate) -> Result<(), ApiError> {
    info!(user_id, name = %details.name, "Profile updated.");
    Ok(())
  }

  async fn record_purchase(&self, request: &PurchaseRecordRequest) -> Result<Ack, ApiError> {
    if let Some(index) = request.course_index {
      self.purchased.lock().push(index);
    }
    Ok(Ack {
      success: true,
      message: Some("Purchase recorded".to_string()),
    })
  }

  async fn record_upi_purchase(&self, _request: &UpiPurchaseRequest) -> Result<Ack, ApiError> {
    Ok(Ack {
      success: true,
      message: Some("Submitted for verification".to_string()),
    })
  }

  async fn check_purchase(&self, _user_id: &str, _faculty_slug: &str, course_index: usize) -> Result<bool, ApiError> {
    Ok(self.purchased.lock().contains(&course_index))
  }
}

// --- SDK that approves every payment ---
struct ApprovingSdk;

#[async_trait]
impl CheckoutSdk for ApprovingSdk {
  async fn load_script(&self, src: &str) -> bool {
    info!(src, "Loading checkout script.");
    true
  }

  fn open(&self, options: RazorpayOptions, sink: ProviderEventSink) -> Result<(), String> {
    info!(paise = options.amount.0, "Checkout popup opened.");
    sink.succeeded(PaymentConfirmation {
      payment_id: "pay_demo_001".to_string(),
      order_id: None,
      signature: None,
    });
    Ok(())
  }
}

struct LoggingNavigator;

impl Navigator for LoggingNavigator {
  fn navigate(&self, route: Route) {
    info!(?route, "Navigate.");
  }
}

fn demo_courses() -> Vec<Course> {
  let raw = serde_json::json!([
    {
      "_id": "fr-01",
      "title": "CA Final Financial Reporting",
      "facultySlug": "rahul-sir",
      "modeAttemptPricing": [
        { "mode": "Live at Home", "attempts": [
          { "attempt": "12 Months", "costPrice": 15999, "sellingPrice": 13999 },
          { "attempt": "6 Months", "costPrice": 9999, "sellingPrice": 8999 }
        ]}
      ]
    },
    {
      "_id": "audit-02",
      "subject": "Audit",
      "facultySlug": "rahul-sir",
      "modes": ["Pendrive"],
      "durations": ["Nov 2025"],
      "costPrice": 12000,
      "sellingPrice": 9999
    }
  ]);
  serde_json::from_value(raw).unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), CheckoutError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Course checkout walkthrough ---");

  let config = Arc::new(
    ClientConfig::new("http://localhost:5000/api")
      .with_razorpay_key("rzp_test_demo")
      .with_redirect_delay(Duration::from_millis(200)),
  );
  let session = Arc::new(SessionStore::new());
  session.sign_in(
    SessionTokens {
      access_token: "demo-token".to_string(),
      refresh_token: None,
      is_admin: false,
    },
    User::new("student-1", "Asha Verma", "asha@example.com", "9876543210"),
  );
  let api = Arc::new(DemoApi {
    courses: demo_courses(),
    purchased: Mutex::new(Vec::new()),
  });
  let gateway = Arc::new(RazorpayGateway::new(ApprovingSdk, &config)?);
  let reconciler = PurchaseStatusReconciler::new(api.clone(), session.clone());

  let catalog = reconciler.load_catalog("rahul-sir").await?;
  for (index, course) in catalog.courses.iter().enumerate() {
    info!(course = course.display_title(), action = catalog.course_action(index).label(), "Faculty page card.");
  }

  let view = CourseDetailView::new(api.clone(), gateway, Arc::new(LoggingNavigator), session, config)?;
  view.load_faculty_course("rahul-sir", 0).await?;
  let price = view.price();
  info!(listed = %price.original, selling = %price.final_price, badge = price.discount_percent(), "Default selection.");

  let outcome = view.apply_coupon("off10").await;
  info!(success = outcome.success, payable = %view.payable(), "{}", outcome.message);

  view.buy_now()?;
  let receipt = view.checkout().pay_with_razorpay().await?;
  info!(transaction = %receipt.transaction_id, amount = %receipt.amount, "Payment recorded.");

  tokio::time::sleep(Duration::from_millis(300)).await;

  let statuses = reconciler.reconcile("rahul-sir", catalog.courses.len()).await;
  info!(?statuses, "Statuses after purchase.");
  Ok(())
}
