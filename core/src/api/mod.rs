// coursecart/src/api/mod.rs

//! The REST API the client runs against.
//!
//! [`CourseApi`] is the seam every component talks through; [`HttpCourseApi`]
//! is the `reqwest` implementation. Paths are relative to `API_URL`:
//!
//! | call                    | endpoint                                              |
//! |-------------------------|-------------------------------------------------------|
//! | `faculty_courses`       | `GET /courses/:facultySlug`                           |
//! | `course_details`        | `GET /courses/details/:courseId?courseType=`          |
//! | `validate_coupon`       | `POST /coupons/validate`                              |
//! | `save_checkout_details` | `PATCH /users/:userId`                                |
//! | `record_purchase`       | `POST /purchase/purchase`                             |
//! | `record_upi_purchase`   | `POST /purchase/upi-purchase`                         |
//! | `check_purchase`        | `GET /purchase/check/:userId/:facultySlug/:courseIndex` |

pub mod http;

pub use http::HttpCourseApi;

use crate::error::ApiError;
use crate::model::{Course, CourseType, PurchaseRecordRequest, UpiPurchaseRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A server acknowledgement (`{ success, message }`) that came back with
/// `success: true`. Implementations turn `success: false` into
/// [`ApiError::Rejected`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>,
}

/// Result of a successful coupon lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponValidation {
  pub discount_percent: f64,
  pub message: Option<String>,
}

/// The editable part of the checkout form, saved back to the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailsUpdate {
  pub name: String,
  pub email: String,
}

#[async_trait]
pub trait CourseApi: Send + Sync {
  /// Courses listed on a faculty page, in display order. A course's position
  /// in this list is its `course_index`.
  async fn faculty_courses(&self, faculty_slug: &str) -> Result<Vec<Course>, ApiError>;

  async fn course_details(&self, course_id: &str, course_type: CourseType) -> Result<Course, ApiError>;

  /// The code is sent as given; callers normalize it.
  async fn validate_coupon(&self, code: &str) -> Result<CouponValidation, ApiError>;

  async fn save_checkout_details(&self, user_id: &str, details: &DetailsUpdate) -> Result<(), ApiError>;

  async fn record_purchase(&self, request: &PurchaseRecordRequest) -> Result<Ack, ApiError>;

  async fn record_upi_purchase(&self, request: &UpiPurchaseRequest) -> Result<Ack, ApiError>;

  async fn check_purchase(&self, user_id: &str, faculty_slug: &str, course_index: usize) -> Result<bool, ApiError>;
}
