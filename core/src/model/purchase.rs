// coursecart/src/model/purchase.rs

use crate::model::course::CourseRef;
use crate::model::money::Rupees;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  Razorpay,
  Upi,
}

impl PaymentMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentMethod::Razorpay => "razorpay",
      PaymentMethod::Upi => "upi",
    }
  }
}

/// Body of `POST /purchase/purchase`, sent once the provider has confirmed
/// the payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecordRequest {
  pub user_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub faculty_slug: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub course_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub course_index: Option<usize>,
  pub amount: Rupees,
  pub payment_method: PaymentMethod,
  pub transaction_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub coupon: Option<String>,
  pub mode: String,
  pub attempt: String,
}

/// Body of `POST /purchase/upi-purchase`. The student paid out of band and
/// typed in the UPI transaction reference (UTR); staff verify it later.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpiPurchaseRequest {
  pub user_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub faculty_slug: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub course_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub course_index: Option<usize>,
  pub amount: Rupees,
  pub transaction_reference: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub coupon: Option<String>,
  pub mode: String,
  pub attempt: String,
  pub full_name: String,
  pub email: String,
  pub phone: String,
}

/// Whether the purchase is already active or waits on staff verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
  Confirmed,
  PendingVerification,
}

/// What the orchestrator keeps after a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
  pub checkout_id: Uuid,
  pub course: CourseRef,
  pub method: PaymentMethod,
  pub transaction_id: String,
  pub amount: Rupees,
  pub verification: Verification,
  pub message: Option<String>,
  pub recorded_at: DateTime<Utc>,
}

/// A selection carried through the login redirect so checkout can resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPurchase {
  pub course: CourseRef,
  pub mode: String,
  pub attempt: String,
}
