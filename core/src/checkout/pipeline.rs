// coursecart/src/checkout/pipeline.rs

//! The checkout as a step pipeline.
//!
//! ```text
//! validate_details → save_details → process_payment → record_purchase → schedule_redirect
//!                                    ├─ razorpay: open_checkout → await_provider_event
//!                                    └─ upi:      submit_upi_reference
//! ```
//!
//! `save_details` is skipped when the form matches the profile, and
//! `record_purchase` is skipped for UPI, whose submission is itself the
//! record.

use crate::api::CourseApi;
use crate::checkout::details::CheckoutDetails;
use crate::config::ClientConfig;
use crate::conditional::Unmatched;
use crate::error::{CheckoutError, FlowError, FlowResult};
use crate::flow::{ContextData, SkipCondition, StepControl};
use crate::model::{
  CourseRef, PaymentMethod, PurchaseReceipt, PurchaseRecordRequest, Rupees, UpiPurchaseRequest, User, Verification,
};
use crate::navigation::{MountGuard, Navigator, Route};
use crate::pipeline::Pipeline;
use crate::provider::{PaymentConfirmation, PaymentGateway, PaymentRequest, ProviderEvent, ProviderEventSink, ProviderEvents};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{event, Level};
use uuid::Uuid;

pub const VALIDATE_DETAILS: &str = "validate_details";
pub const SAVE_DETAILS: &str = "save_details";
pub const PROCESS_PAYMENT: &str = "process_payment";
pub const RECORD_PURCHASE: &str = "record_purchase";
pub const SCHEDULE_REDIRECT: &str = "schedule_redirect";

/// Collaborators every checkout run needs.
#[derive(Clone)]
pub struct CheckoutDeps {
  pub api: Arc<dyn CourseApi>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub navigator: Arc<dyn Navigator>,
  pub config: Arc<ClientConfig>,
  pub mount: MountGuard,
}

/// Sub-context of the `razorpay` route.
pub struct RazorpaySubCtx {
  pub gateway: Arc<dyn PaymentGateway>,
  pub request: PaymentRequest,
  pub events: Option<ProviderEvents>,
  pub confirmation: Option<PaymentConfirmation>,
}

/// Sub-context of the `upi` route.
pub struct UpiSubCtx {
  pub api: Arc<dyn CourseApi>,
  pub request: UpiPurchaseRequest,
  pub server_message: Option<String>,
  pub submitted: bool,
}

#[derive(Clone)]
pub enum ActivePayment {
  None,
  Razorpay(ContextData<RazorpaySubCtx>),
  Upi(ContextData<UpiSubCtx>),
}

/// Data for one checkout run.
pub struct CheckoutCtxData {
  pub deps: CheckoutDeps,
  pub checkout_id: Uuid,
  pub user: User,
  pub course: CourseRef,
  pub mode: String,
  pub attempt: String,
  /// What the student is charged, coupon included.
  pub amount: Rupees,
  pub coupon: Option<String>,
  pub details: CheckoutDetails,
  pub method: PaymentMethod,
  /// The UTR typed in by the student on the UPI path.
  pub upi_reference: Option<String>,
  pub payment: ActivePayment,
  pub transaction_id: Option<String>,
  pub receipt: Option<PurchaseReceipt>,
  pub redirect: Option<JoinHandle<()>>,
}

impl CheckoutCtxData {
  fn receipt(&self, transaction_id: String, verification: Verification, message: Option<String>) -> PurchaseReceipt {
    PurchaseReceipt {
      checkout_id: self.checkout_id,
      course: self.course.clone(),
      method: self.method,
      transaction_id,
      amount: self.amount,
      verification,
      message,
      recorded_at: Utc::now(),
    }
  }

  fn payment_request(&self) -> PaymentRequest {
    let mut notes = BTreeMap::new();
    notes.insert("checkoutId".to_string(), self.checkout_id.to_string());
    notes.insert("mode".to_string(), self.mode.clone());
    notes.insert("attempt".to_string(), self.attempt.clone());
    if let Some(code) = &self.coupon {
      notes.insert("coupon".to_string(), code.clone());
    }
    PaymentRequest {
      amount: self.amount,
      description: format!("{} ({}, {})", self.course.title, self.mode, self.attempt),
      customer: self.details.customer(),
      notes,
    }
  }

  fn upi_request(&self, reference: String) -> UpiPurchaseRequest {
    let customer = self.details.customer();
    UpiPurchaseRequest {
      user_id: self.user.id.clone(),
      faculty_slug: self.course.faculty_slug.clone(),
      course_id: self.course.course_id.clone(),
      course_index: self.course.course_index,
      amount: self.amount,
      transaction_reference: reference,
      coupon: self.coupon.clone(),
      mode: self.mode.clone(),
      attempt: self.attempt.clone(),
      full_name: customer.name,
      email: customer.email,
      phone: customer.contact,
    }
  }
}

/// Builds the checkout pipeline with both payment routes.
pub fn build_checkout_pipeline() -> FlowResult<Pipeline<CheckoutCtxData, CheckoutError>> {
  let details_unchanged: SkipCondition<CheckoutCtxData> = Arc::new(|ctx: &ContextData<CheckoutCtxData>| {
    let guard = ctx.read();
    !guard.details.differs_from(&guard.user)
  });
  let upi_method: SkipCondition<CheckoutCtxData> =
    Arc::new(|ctx: &ContextData<CheckoutCtxData>| ctx.read().method == PaymentMethod::Upi);

  let mut p = Pipeline::<CheckoutCtxData, CheckoutError>::new(&[
    (VALIDATE_DETAILS, false, None),
    (SAVE_DETAILS, false, Some(details_unchanged)),
    (PROCESS_PAYMENT, false, None),
    (RECORD_PURCHASE, false, Some(upi_method)),
    (SCHEDULE_REDIRECT, true, None),
  ]);

  p.on_root(VALIDATE_DETAILS, |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let guard = ctx.read();
      guard.details.validate()?;
      if guard.amount.is_zero() {
        return Err(CheckoutError::Validation(
          "No valid price for the selected mode and attempt".to_string(),
        ));
      }
      if guard.method == PaymentMethod::Upi && guard.upi_reference.is_none() {
        return Err(CheckoutError::Validation("Please enter the UPI transaction reference".to_string()));
      }
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  })?;

  p.on_root(SAVE_DETAILS, |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (api, user_id, update) = ctx.with(|c| (c.deps.api.clone(), c.user.id.clone(), c.details.to_update()));
      event!(Level::INFO, %user_id, "Saving checkout details to profile.");
      api.save_checkout_details(&user_id, &update).await?;
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  })?;

  // Builds the chosen route's sub-context before routing.
  p.before_root(PROCESS_PAYMENT, |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.payment = match guard.method {
        PaymentMethod::Razorpay => ActivePayment::Razorpay(ContextData::new(RazorpaySubCtx {
          gateway: guard.deps.gateway.clone(),
          request: guard.payment_request(),
          events: None,
          confirmation: None,
        })),
        PaymentMethod::Upi => {
          let reference = guard
            .upi_reference
            .clone()
            .ok_or_else(|| CheckoutError::Internal("UPI route without a reference".to_string()))?;
          ActivePayment::Upi(ContextData::new(UpiSubCtx {
            api: guard.deps.api.clone(),
            request: guard.upi_request(reference),
            server_message: None,
            submitted: false,
          }))
        }
      };
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  })?;

  p.routes_for_step(PROCESS_PAYMENT)?
    .route("razorpay", Arc::new(razorpay_route()?), |ctx: &ContextData<CheckoutCtxData>| {
      match &ctx.read().payment {
        ActivePayment::Razorpay(sub) => Ok(sub.clone()),
        _ => Err(FlowError::RouteExtraction {
          step_name: PROCESS_PAYMENT.to_string(),
          source: anyhow::anyhow!("razorpay sub-context missing"),
        }),
      }
    })
    .when(|ctx: &ContextData<CheckoutCtxData>| ctx.read().method == PaymentMethod::Razorpay)
    .route("upi", Arc::new(upi_route()?), |ctx: &ContextData<CheckoutCtxData>| {
      match &ctx.read().payment {
        ActivePayment::Upi(sub) => Ok(sub.clone()),
        _ => Err(FlowError::RouteExtraction {
          step_name: PROCESS_PAYMENT.to_string(),
          source: anyhow::anyhow!("upi sub-context missing"),
        }),
      }
    })
    .when(|ctx: &ContextData<CheckoutCtxData>| ctx.read().method == PaymentMethod::Upi)
    .if_unmatched(Unmatched::Fail)
    .finalize(false);

  // Lifts the route's result into the parent context.
  p.after_root(PROCESS_PAYMENT, |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      match guard.payment.clone() {
        ActivePayment::Razorpay(sub) => {
          let confirmation = sub
            .read()
            .confirmation
            .clone()
            .ok_or_else(|| CheckoutError::Internal("razorpay route finished without a confirmation".to_string()))?;
          guard.transaction_id = Some(confirmation.payment_id);
        }
        ActivePayment::Upi(sub) => {
          let (submitted, reference, message) = sub.with(|s| {
            (
              s.submitted,
              s.request.transaction_reference.clone(),
              s.server_message.clone(),
            )
          });
          if !submitted {
            return Err(CheckoutError::Internal("upi route finished without submitting".to_string()));
          }
          let receipt = guard.receipt(reference.clone(), Verification::PendingVerification, message);
          guard.transaction_id = Some(reference);
          guard.receipt = Some(receipt);
        }
        ActivePayment::None => return Ok(StepControl::Halt),
      }
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  })?;

  p.on_root(RECORD_PURCHASE, |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (api, request) = {
        let guard = ctx.read();
        let transaction_id = guard
          .transaction_id
          .clone()
          .ok_or_else(|| CheckoutError::Internal("no transaction id to record".to_string()))?;
        let request = PurchaseRecordRequest {
          user_id: guard.user.id.clone(),
          faculty_slug: guard.course.faculty_slug.clone(),
          course_id: guard.course.course_id.clone(),
          course_index: guard.course.course_index,
          amount: guard.amount,
          payment_method: guard.method,
          transaction_id,
          coupon: guard.coupon.clone(),
          mode: guard.mode.clone(),
          attempt: guard.attempt.clone(),
        };
        (guard.deps.api.clone(), request)
      };

      match api.record_purchase(&request).await {
        Ok(ack) => {
          event!(Level::INFO, transaction_id = %request.transaction_id, "Purchase recorded.");
          let mut guard = ctx.write();
          let receipt = guard.receipt(request.transaction_id, Verification::Confirmed, ack.message);
          guard.receipt = Some(receipt);
          Ok(StepControl::Continue)
        }
        Err(e) => {
          event!(
            Level::ERROR,
            transaction_id = %request.transaction_id,
            error = %e,
            "Payment captured but purchase record failed."
          );
          Err(CheckoutError::PaymentNotRecorded {
            transaction_id: request.transaction_id,
            message: e.to_string(),
          })
        }
      }
    })
  })?;

  p.on_root(SCHEDULE_REDIRECT, |ctx: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (navigator, mount, delay) = ctx.with(|c| {
        (
          c.deps.navigator.clone(),
          c.deps.mount.clone(),
          c.deps.config.redirect_delay,
        )
      });
      let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if mount.is_mounted() {
          navigator.navigate(Route::Dashboard);
        } else {
          event!(Level::DEBUG, "View unmounted, dashboard redirect dropped.");
        }
      });
      ctx.write().redirect = Some(handle);
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  })?;

  Ok(p)
}

fn razorpay_route() -> FlowResult<Pipeline<RazorpaySubCtx, CheckoutError>> {
  let mut p = Pipeline::<RazorpaySubCtx, CheckoutError>::new(&[
    ("open_checkout", false, None),
    ("await_provider_event", false, None),
  ]);

  p.on_root("open_checkout", |sub: ContextData<RazorpaySubCtx>| {
    Box::pin(async move {
      let (gateway, request) = sub.with(|s| (s.gateway.clone(), s.request.clone()));
      let (sink, events) = ProviderEventSink::channel();
      gateway.open(&request, sink).await?;
      sub.write().events = Some(events);
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  })?;

  p.on_root("await_provider_event", |sub: ContextData<RazorpaySubCtx>| {
    Box::pin(async move {
      let events = sub
        .write()
        .events
        .take()
        .ok_or_else(|| CheckoutError::Internal("provider events already consumed".to_string()))?;
      match events.outcome().await {
        ProviderEvent::Succeeded(confirmation) => {
          event!(Level::INFO, payment_id = %confirmation.payment_id, "Provider reported success.");
          sub.write().confirmation = Some(confirmation);
          Ok(StepControl::Continue)
        }
        ProviderEvent::Failed { code, description } => {
          event!(Level::WARN, %code, %description, "Provider reported failure.");
          Err(CheckoutError::Provider(description))
        }
        ProviderEvent::Dismissed => {
          event!(Level::INFO, "Provider checkout dismissed.");
          Err(CheckoutError::Provider("Payment was cancelled".to_string()))
        }
      }
    })
  })?;

  Ok(p)
}

fn upi_route() -> FlowResult<Pipeline<UpiSubCtx, CheckoutError>> {
  let mut p = Pipeline::<UpiSubCtx, CheckoutError>::new(&[("submit_upi_reference", false, None)]);

  p.on_root("submit_upi_reference", |sub: ContextData<UpiSubCtx>| {
    Box::pin(async move {
      let (api, request) = sub.with(|s| (s.api.clone(), s.request.clone()));
      let ack = api.record_upi_purchase(&request).await?;
      event!(Level::INFO, reference = %request.transaction_reference, "UPI payment submitted for verification.");
      let mut guard = sub.write();
      guard.server_message = ack.message;
      guard.submitted = true;
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  })?;

  Ok(p)
}
