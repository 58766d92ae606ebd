// coursecart/src/coupon.rs

//! Coupon validation and the discount it puts on the selected price.
//!
//! Validation is entirely server-side. The only local check is that a code
//! was entered at all.

use crate::api::CourseApi;
use crate::model::Rupees;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Result of one coupon application. On failure `discount_percent` is zero
/// and `final_price` equals `base_price`.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponOutcome {
  pub success: bool,
  pub code: String,
  pub discount_percent: f64,
  pub base_price: Rupees,
  pub final_price: Rupees,
  pub message: String,
}

impl CouponOutcome {
  fn failed(code: String, base_price: Rupees, message: impl Into<String>) -> Self {
    Self {
      success: false,
      code,
      discount_percent: 0.0,
      base_price,
      final_price: base_price,
      message: message.into(),
    }
  }
}

/// Trims and upper-cases a code as typed by the student.
pub fn normalize_code(code: &str) -> String {
  code.trim().to_uppercase()
}

#[derive(Clone)]
pub struct CouponApplier {
  api: Arc<dyn CourseApi>,
}

impl CouponApplier {
  pub fn new(api: Arc<dyn CourseApi>) -> Self {
    Self { api }
  }

  #[instrument(name = "CouponApplier::apply_coupon", skip(self), fields(base = base_price.0))]
  pub async fn apply_coupon(&self, code: &str, base_price: Rupees) -> CouponOutcome {
    let code = normalize_code(code);
    if code.is_empty() {
      return CouponOutcome::failed(code, base_price, "Please enter a coupon code");
    }

    match self.api.validate_coupon(&code).await {
      Ok(validation) if (0.0..=100.0).contains(&validation.discount_percent) => {
        let final_price = base_price.discounted_by(validation.discount_percent);
        event!(Level::INFO, %code, percent = validation.discount_percent, final_price = final_price.0, "Coupon applied.");
        CouponOutcome {
          success: true,
          message: validation
            .message
            .unwrap_or_else(|| format!("Coupon applied: {}% off", validation.discount_percent)),
          code,
          discount_percent: validation.discount_percent,
          base_price,
          final_price,
        }
      }
      Ok(validation) => {
        event!(Level::WARN, %code, percent = validation.discount_percent, "Coupon discount out of range, ignoring.");
        CouponOutcome::failed(code, base_price, "Invalid coupon code")
      }
      Err(e) => {
        event!(Level::WARN, %code, error = %e, "Coupon validation failed.");
        let message = e.server_message().unwrap_or("Invalid coupon code").to_string();
        CouponOutcome::failed(code, base_price, message)
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
struct AppliedCoupon {
  code: String,
  discount_percent: f64,
  final_price: Rupees,
}

/// The coupon currently applied to a selection, if any.
///
/// A coupon is tied to the price it was applied against: recording an
/// outcome for a different base, or rebasing onto a new price, drops it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponState {
  base_price: Rupees,
  applied: Option<AppliedCoupon>,
  message: Option<String>,
}

impl CouponState {
  pub fn new(base_price: Rupees) -> Self {
    Self {
      base_price,
      ..Self::default()
    }
  }

  /// Records an outcome. Failures and outcomes computed against a stale base
  /// price leave no discount behind.
  pub fn record(&mut self, outcome: CouponOutcome) {
    if outcome.base_price != self.base_price {
      event!(
        Level::DEBUG,
        code = %outcome.code,
        outcome_base = outcome.base_price.0,
        current_base = self.base_price.0,
        "Dropping coupon outcome for a stale price."
      );
      self.applied = None;
      self.message = None;
      return;
    }
    self.applied = outcome.success.then(|| AppliedCoupon {
      code: outcome.code,
      discount_percent: outcome.discount_percent,
      final_price: outcome.final_price,
    });
    self.message = Some(outcome.message);
  }

  /// Moves to a new base price, clearing any coupon when it differs.
  pub fn rebase(&mut self, base_price: Rupees) {
    if base_price != self.base_price {
      self.base_price = base_price;
      self.clear();
    }
  }

  pub fn clear(&mut self) {
    self.applied = None;
    self.message = None;
  }

  pub fn base_price(&self) -> Rupees {
    self.base_price
  }

  /// What the student pays: the discounted price, or the base price.
  pub fn final_price(&self) -> Rupees {
    self.applied.as_ref().map_or(self.base_price, |c| c.final_price)
  }

  pub fn discount_percent(&self) -> f64 {
    self.applied.as_ref().map_or(0.0, |c| c.discount_percent)
  }

  pub fn applied_code(&self) -> Option<&str> {
    self.applied.as_ref().map(|c| c.code.as_str())
  }

  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }
}
