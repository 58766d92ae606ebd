// coursecart/src/api/http.rs

use super::{Ack, CouponValidation, CourseApi, DetailsUpdate};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::model::{Course, CourseType, PurchaseRecordRequest, UpiPurchaseRequest};
use crate::session::SessionStore;
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{event, instrument, Level};
use url::Url;

#[derive(Deserialize)]
struct CoursesEnvelope {
  #[serde(default)]
  courses: Vec<Course>,
}

#[derive(Deserialize)]
struct CourseEnvelope {
  course: Course,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseCheckEnvelope {
  #[serde(default)]
  success: bool,
  #[serde(default)]
  has_purchased: bool,
  #[serde(default)]
  message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CouponEnvelope {
  #[serde(default)]
  success: bool,
  #[serde(default, alias = "discount")]
  discount_percent: Option<f64>,
  #[serde(default)]
  coupon: Option<NestedCoupon>,
  #[serde(default)]
  message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedCoupon {
  #[serde(alias = "discount")]
  discount_percent: f64,
}

#[derive(Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  error: Option<String>,
}

/// `reqwest`-backed [`CourseApi`].
///
/// The bearer token is read from the shared [`SessionStore`] as one snapshot
/// per request.
#[derive(Clone)]
pub struct HttpCourseApi {
  client: Client,
  base_url: Url,
  session: Arc<SessionStore>,
}

impl HttpCourseApi {
  pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
    let client = Client::builder()
      .use_rustls_tls()
      .timeout(config.request_timeout)
      .build()
      .map_err(|e| ApiError::Network(e.to_string()))?;
    let base_url = Url::parse(&config.api_url).map_err(|e| ApiError::Network(format!("invalid API_URL: {}", e)))?;
    Ok(Self {
      client,
      base_url,
      session,
    })
  }

  /// Appends percent-encoded path segments to the API base.
  pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| ApiError::Network(format!("API_URL cannot be a base: {}", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
    match self.session.snapshot().bearer() {
      Some(bearer) => request.header(header::AUTHORIZATION, bearer),
      None => request,
    }
  }

  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
    let response = self.authorized(request).send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
      event!(Level::WARN, status = status.as_u16(), reason = %message, "API request failed.");
      return Err(ApiError::Status {
        status: status.as_u16(),
        message,
      });
    }
    response.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
  }

  async fn send_ack(&self, request: RequestBuilder) -> Result<Ack, ApiError> {
    let ack: Ack = self.send(request).await?;
    if ack.success {
      Ok(ack)
    } else {
      Err(ApiError::Rejected(ack.message.unwrap_or_default()))
    }
  }
}

#[async_trait]
impl CourseApi for HttpCourseApi {
  #[instrument(skip(self), err(Display))]
  async fn faculty_courses(&self, faculty_slug: &str) -> Result<Vec<Course>, ApiError> {
    let url = self.endpoint(&["courses", faculty_slug])?;
    let envelope: CoursesEnvelope = self.send(self.client.get(url)).await?;
    Ok(envelope.courses)
  }

  #[instrument(skip(self), err(Display))]
  async fn course_details(&self, course_id: &str, course_type: CourseType) -> Result<Course, ApiError> {
    let mut url = self.endpoint(&["courses", "details", course_id])?;
    url.query_pairs_mut().append_pair("courseType", course_type.as_query());
    let envelope: CourseEnvelope = self.send(self.client.get(url)).await?;
    Ok(envelope.course)
  }

  #[instrument(skip(self), err(Display))]
  async fn validate_coupon(&self, code: &str) -> Result<CouponValidation, ApiError> {
    let url = self.endpoint(&["coupons", "validate"])?;
    let envelope: CouponEnvelope = self.send(self.client.post(url).json(&json!({ "code": code }))).await?;
    if !envelope.success {
      return Err(ApiError::Rejected(
        envelope.message.unwrap_or_else(|| "Invalid coupon code".to_string()),
      ));
    }
    let discount_percent = envelope
      .discount_percent
      .or(envelope.coupon.map(|c| c.discount_percent))
      .ok_or_else(|| ApiError::Decode("coupon response has no discountPercent".to_string()))?;
    Ok(CouponValidation {
      discount_percent,
      message: envelope.message,
    })
  }

  #[instrument(skip(self, details), err(Display))]
  async fn save_checkout_details(&self, user_id: &str, details: &DetailsUpdate) -> Result<(), ApiError> {
    let url = self.endpoint(&["users", user_id])?;
    self.send_ack(self.client.patch(url).json(details)).await.map(|_| ())
  }

  #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id), err(Display))]
  async fn record_purchase(&self, request: &PurchaseRecordRequest) -> Result<Ack, ApiError> {
    let url = self.endpoint(&["purchase", "purchase"])?;
    self.send_ack(self.client.post(url).json(request)).await
  }

  #[instrument(skip(self, request), fields(reference = %request.transaction_reference), err(Display))]
  async fn record_upi_purchase(&self, request: &UpiPurchaseRequest) -> Result<Ack, ApiError> {
    let url = self.endpoint(&["purchase", "upi-purchase"])?;
    self.send_ack(self.client.post(url).json(request)).await
  }

  #[instrument(skip(self), err(Display))]
  async fn check_purchase(&self, user_id: &str, faculty_slug: &str, course_index: usize) -> Result<bool, ApiError> {
    let index = course_index.to_string();
    let url = self.endpoint(&["purchase", "check", user_id, faculty_slug, &index])?;
    let envelope: PurchaseCheckEnvelope = self.send(self.client.get(url)).await?;
    if !envelope.success {
      return Err(ApiError::Rejected(envelope.message.unwrap_or_default()));
    }
    Ok(envelope.has_purchased)
  }
}
