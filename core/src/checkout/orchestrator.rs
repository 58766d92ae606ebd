// coursecart/src/checkout/orchestrator.rs

use crate::api::CourseApi;
use crate::checkout::details::CheckoutDetails;
use crate::checkout::pipeline::{build_checkout_pipeline, ActivePayment, CheckoutCtxData, CheckoutDeps};
use crate::checkout::state::{CheckoutEvent, CheckoutMachine, CheckoutState};
use crate::config::ClientConfig;
use crate::coupon::CouponState;
use crate::error::{CheckoutError, Result};
use crate::flow::{ContextData, FlowOutcome};
use crate::model::{Course, CourseRef, PaymentMethod, PendingPurchase, PurchaseReceipt, Rupees, User, Verification};
use crate::navigation::{MountGuard, Navigator, Route};
use crate::pipeline::Pipeline;
use crate::pricing::Selection;
use crate::provider::PaymentGateway;
use crate::session::SessionStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{event, instrument, Level};
use url::Url;
use uuid::Uuid;

/// What "Buy Now" committed to: the course, the selection and the amount.
#[derive(Debug, Clone)]
struct ActiveCheckout {
  user: User,
  course: CourseRef,
  mode: String,
  attempt: String,
  amount: Rupees,
  coupon: Option<String>,
  details: CheckoutDetails,
}

#[derive(Default)]
struct OrchestratorState {
  machine: CheckoutMachine,
  checkout: Option<ActiveCheckout>,
  message: Option<String>,
  receipt: Option<PurchaseReceipt>,
  redirect: Option<JoinHandle<()>>,
}

/// Drives one course's checkout from "Buy Now" to the dashboard redirect.
///
/// Every payment attempt runs the checkout pipeline. The machine only
/// reaches `PaymentSuccess` once the provider has confirmed and the purchase
/// has been recorded. Once the owning view unmounts, results of in-flight
/// attempts are no longer written back.
pub struct CheckoutOrchestrator {
  deps: CheckoutDeps,
  session: Arc<SessionStore>,
  pipeline: Arc<Pipeline<CheckoutCtxData, CheckoutError>>,
  state: ContextData<OrchestratorState>,
}

impl CheckoutOrchestrator {
  pub fn new(
    api: Arc<dyn CourseApi>,
    gateway: Arc<dyn PaymentGateway>,
    navigator: Arc<dyn Navigator>,
    session: Arc<SessionStore>,
    config: Arc<ClientConfig>,
    mount: MountGuard,
  ) -> Result<Self> {
    let pipeline = build_checkout_pipeline()?;
    Ok(Self {
      deps: CheckoutDeps {
        api,
        gateway,
        navigator,
        config,
        mount,
      },
      session,
      pipeline: Arc::new(pipeline),
      state: ContextData::default(),
    })
  }

  pub fn state(&self) -> CheckoutState {
    self.state.read().machine.state()
  }

  pub fn is_processing(&self) -> bool {
    self.state.read().machine.is_processing()
  }

  /// The last message for the student, success or failure.
  pub fn message(&self) -> Option<String> {
    self.state.read().message.clone()
  }

  pub fn receipt(&self) -> Option<PurchaseReceipt> {
    self.state.read().receipt.clone()
  }

  pub fn details(&self) -> Option<CheckoutDetails> {
    self.state.read().checkout.as_ref().map(|c| c.details.clone())
  }

  /// The amount "Buy Now" committed to.
  pub fn amount(&self) -> Option<Rupees> {
    self.state.read().checkout.as_ref().map(|c| c.amount)
  }

  /// "Buy Now".
  ///
  /// With no complete, priced selection the machine stays `Idle` and a
  /// `Validation` error is returned. Without a signed-in user the student is
  /// sent to login with the selection as [`PendingPurchase`] and
  /// `Unauthenticated` is returned. Otherwise checkout moves to
  /// `DetailsCollection` with the form prefilled from the profile.
  ///
  /// A coupon is honoured only when it was applied against the selection's
  /// current price.
  #[instrument(name = "CheckoutOrchestrator::buy_now", skip_all, fields(course = %course.title))]
  pub fn buy_now(&self, course: &CourseRef, selection: &Selection, coupon: Option<&CouponState>) -> Result<CheckoutState> {
    let (Some(mode), Some(attempt)) = (selection.mode(), selection.attempt()) else {
      return Err(self.reject("Please select a mode and attempt"));
    };
    if !selection.has_valid_price() {
      return Err(self.reject("No valid price for the selected mode and attempt"));
    }

    let Some(user) = self.session.current_user() else {
      let pending = PendingPurchase {
        course: course.clone(),
        mode: mode.to_string(),
        attempt: attempt.to_string(),
      };
      event!(Level::INFO, mode, attempt, "Not signed in, redirecting to login.");
      self.deps.navigator.navigate(Route::Login { pending });
      return Err(CheckoutError::Unauthenticated);
    };

    let base = selection.price().final_price;
    let (amount, coupon_code) = match coupon {
      Some(c) if c.base_price() == base && c.applied_code().is_some() => {
        (c.final_price(), c.applied_code().map(str::to_string))
      }
      _ => (base, None),
    };

    let mut state = self.state.write();
    let next = state.machine.apply(CheckoutEvent::Begin)?;
    state.message = None;
    state.receipt = None;
    state.checkout = Some(ActiveCheckout {
      details: CheckoutDetails::prefilled(&user),
      user,
      course: course.clone(),
      mode: mode.to_string(),
      attempt: attempt.to_string(),
      amount,
      coupon: coupon_code,
    });
    event!(Level::INFO, mode, attempt, amount = amount.0, "Checkout started.");
    Ok(next)
  }

  /// Picks up a purchase carried through the login redirect. The labels are
  /// resolved against `course` again, so a selection that no longer exists is
  /// rejected like any incomplete one. `course` must be the course the
  /// purchase was started for.
  pub fn resume_after_login(&self, pending: &PendingPurchase, course: &Course) -> Result<CheckoutState> {
    ensure_same_course(pending, course)?;
    let selection = Selection::restore(course, &pending.mode, &pending.attempt);
    self.buy_now(&pending.course, &selection, None)
  }

  pub fn set_full_name(&self, value: impl Into<String>) -> Result<()> {
    self.edit_details("edit name", |d| {
      d.set_full_name(value);
      Ok(())
    })
  }

  pub fn set_email(&self, value: impl Into<String>) -> Result<()> {
    self.edit_details("edit email", |d| {
      d.set_email(value);
      Ok(())
    })
  }

  /// Fails when the phone number came from the profile.
  pub fn set_phone(&self, value: impl Into<String>) -> Result<()> {
    self.edit_details("edit phone", |d| d.set_phone(value))
  }

  pub async fn pay_with_razorpay(&self) -> Result<PurchaseReceipt> {
    self.pay(PaymentMethod::Razorpay, None).await
  }

  /// Submits a manual UPI payment for staff verification. `reference` is the
  /// UPI transaction reference (UTR): 6 to 35 ASCII letters or digits.
  pub async fn pay_with_upi(&self, reference: &str) -> Result<PurchaseReceipt> {
    let reference = reference.trim();
    if !(6..=35).contains(&reference.len()) || !reference.chars().all(|c| c.is_ascii_alphanumeric()) {
      return Err(CheckoutError::Validation(
        "Please enter a valid UPI transaction reference (6-35 letters or digits)".to_string(),
      ));
    }
    self.pay(PaymentMethod::Upi, Some(reference.to_string())).await
  }

  /// A `upi://pay` URI for the committed amount, for the host to render as a
  /// QR code.
  pub fn upi_payment_uri(&self) -> Result<String> {
    let config = &self.deps.config;
    let vpa = config
      .upi_payee_vpa
      .as_deref()
      .ok_or_else(|| CheckoutError::Config("UPI_PAYEE_VPA is not set".to_string()))?;
    let (amount, note) = {
      let state = self.state.read();
      let checkout = state.checkout.as_ref().ok_or(CheckoutError::InvalidTransition {
        action: "show UPI details",
        state: state.machine.state().as_str(),
      })?;
      (checkout.amount, format!("{} {}", checkout.course.title, checkout.mode))
    };

    let mut uri = Url::parse("upi://pay").map_err(|e| CheckoutError::Internal(e.to_string()))?;
    uri
      .query_pairs_mut()
      .append_pair("pa", vpa)
      .append_pair("pn", &config.upi_payee_name)
      .append_pair("am", &amount.0.to_string())
      .append_pair("cu", &config.currency)
      .append_pair("tn", &note);
    // Spaces go out as %20. A literal plus is already `%2B`.
    let query = uri.query().unwrap_or_default().replace('+', "%20");
    uri.set_query(Some(&query));
    Ok(uri.into())
  }

  /// Closes the checkout panel. Not allowed while a payment is in flight.
  pub fn close(&self) -> Result<CheckoutState> {
    let mut state = self.state.write();
    let next = state.machine.apply(CheckoutEvent::Close)?;
    state.checkout = None;
    state.message = None;
    Ok(next)
  }

  /// The owning view went away: drop later results and any pending redirect.
  pub fn unmount(&self) {
    self.deps.mount.unmount();
    if let Some(handle) = self.state.write().redirect.take() {
      handle.abort();
    }
    event!(Level::DEBUG, "Checkout view unmounted.");
  }

  #[instrument(name = "CheckoutOrchestrator::pay", skip(self, upi_reference), fields(method = method.as_str()))]
  async fn pay(&self, method: PaymentMethod, upi_reference: Option<String>) -> Result<PurchaseReceipt> {
    let ctx_data = {
      let mut state = self.state.write();
      if state.machine.is_processing() {
        return Err(CheckoutError::Busy);
      }
      let current = state.machine.state();
      let checkout = match (&state.checkout, current.accepts_payment()) {
        (Some(checkout), true) => checkout.clone(),
        _ => {
          return Err(CheckoutError::InvalidTransition {
            action: "start payment",
            state: current.as_str(),
          })
        }
      };
      if let Err(e) = checkout.details.validate() {
        state.message = Some(e.user_message());
        return Err(e);
      }
      state.machine.apply(CheckoutEvent::Submit)?;
      state.message = None;

      ContextData::new(CheckoutCtxData {
        deps: self.deps.clone(),
        checkout_id: Uuid::new_v4(),
        user: checkout.user,
        course: checkout.course,
        mode: checkout.mode,
        attempt: checkout.attempt,
        amount: checkout.amount,
        coupon: checkout.coupon,
        details: checkout.details,
        method,
        upi_reference,
        payment: ActivePayment::None,
        transaction_id: None,
        receipt: None,
        redirect: None,
      })
    };

    let run = self.pipeline.run(ctx_data.clone()).await;

    let (receipt, redirect) = {
      let mut data = ctx_data.write();
      (data.receipt.take(), data.redirect.take())
    };

    if !self.deps.mount.is_mounted() {
      event!(Level::INFO, "View unmounted during payment, result not applied.");
      if let Some(handle) = redirect {
        handle.abort();
      }
      return match (run, receipt) {
        (Ok(FlowOutcome::Completed), Some(receipt)) => Ok(receipt),
        (Err(e), _) => Err(e),
        _ => Err(CheckoutError::Provider("Payment was not completed".to_string())),
      };
    }

    let mut state = self.state.write();
    match (run, receipt) {
      (Ok(FlowOutcome::Completed), Some(receipt)) => {
        state.machine.apply(CheckoutEvent::Recorded)?;
        state.message = Some(
          receipt
            .message
            .clone()
            .unwrap_or_else(|| success_message(&receipt).to_string()),
        );
        state.receipt = Some(receipt.clone());
        state.redirect = redirect;
        event!(Level::INFO, transaction_id = %receipt.transaction_id, "Checkout complete.");
        Ok(receipt)
      }
      (Ok(_), _) => {
        let err = CheckoutError::Provider("Payment was not completed".to_string());
        fail(&mut state, &err);
        Err(err)
      }
      (Err(err), _) => {
        fail(&mut state, &err);
        Err(err)
      }
    }
  }

  fn edit_details(&self, action: &'static str, f: impl FnOnce(&mut CheckoutDetails) -> Result<()>) -> Result<()> {
    let mut state = self.state.write();
    let current = state.machine.state();
    match state.checkout.as_mut() {
      Some(checkout) if current.accepts_payment() => f(&mut checkout.details),
      _ => Err(CheckoutError::InvalidTransition {
        action,
        state: current.as_str(),
      }),
    }
  }

  fn reject(&self, message: &str) -> CheckoutError {
    event!(Level::WARN, reason = message, "Buy Now rejected.");
    self.state.write().message = Some(message.to_string());
    CheckoutError::Validation(message.to_string())
  }
}

pub(crate) fn ensure_same_course(pending: &PendingPurchase, course: &Course) -> Result<()> {
  if pending.course.refers_to(course) {
    return Ok(());
  }
  event!(
    Level::WARN,
    pending = ?pending.course.course_id,
    loaded = ?course.id,
    "Resumed purchase does not match the loaded course."
  );
  Err(CheckoutError::Validation(
    "This purchase was started for a different course".to_string(),
  ))
}

fn fail(state: &mut OrchestratorState, err: &CheckoutError) {
  if let Err(e) = state.machine.apply(CheckoutEvent::Fail) {
    event!(Level::ERROR, error = %e, "Could not move checkout to failed.");
  }
  match err {
    CheckoutError::PaymentNotRecorded { transaction_id, message } => {
      event!(Level::ERROR, %transaction_id, reason = %message, "Payment needs manual reconciliation.");
    }
    other => event!(Level::WARN, error = %other, "Payment attempt failed."),
  }
  state.message = Some(err.user_message());
}

fn success_message(receipt: &PurchaseReceipt) -> &'static str {
  match receipt.verification {
    Verification::Confirmed => "Payment successful! Redirecting to your dashboard...",
    Verification::PendingVerification => {
      "Payment details submitted. Your course will be activated once the payment is verified."
    }
  }
}
