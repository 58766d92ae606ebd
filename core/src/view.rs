// coursecart/src/view.rs

//! View model behind a course-detail page: loads the course, holds the
//! mode/attempt selection and the applied coupon, and hands "Buy Now" to the
//! [`CheckoutOrchestrator`].

use crate::api::CourseApi;
use crate::checkout::orchestrator::ensure_same_course;
use crate::checkout::{CheckoutOrchestrator, CheckoutState};
use crate::config::ClientConfig;
use crate::coupon::{CouponApplier, CouponOutcome, CouponState};
use crate::error::{ApiError, CheckoutError, Result};
use crate::flow::ContextData;
use crate::model::{AttemptPrice, Course, CourseRef, CourseType, PendingPurchase, Price, Rupees};
use crate::navigation::{MountGuard, Navigator};
use crate::pricing::Selection;
use crate::provider::PaymentGateway;
use crate::session::SessionStore;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[derive(Debug, Default)]
struct ViewState {
  course: Option<(Course, CourseRef)>,
  selection: Selection,
  coupon: CouponState,
  loading: bool,
  error: Option<String>,
}

pub struct CourseDetailView {
  api: Arc<dyn CourseApi>,
  mount: MountGuard,
  coupons: CouponApplier,
  checkout: CheckoutOrchestrator,
  state: ContextData<ViewState>,
}

impl CourseDetailView {
  pub fn new(
    api: Arc<dyn CourseApi>,
    gateway: Arc<dyn PaymentGateway>,
    navigator: Arc<dyn Navigator>,
    session: Arc<SessionStore>,
    config: Arc<ClientConfig>,
  ) -> Result<Self> {
    let mount = MountGuard::new();
    let checkout = CheckoutOrchestrator::new(api.clone(), gateway, navigator, session, config, mount.clone())?;
    Ok(Self {
      coupons: CouponApplier::new(api.clone()),
      api,
      mount,
      checkout,
      state: ContextData::default(),
    })
  }

  pub fn checkout(&self) -> &CheckoutOrchestrator {
    &self.checkout
  }

  pub fn is_mounted(&self) -> bool {
    self.mount.is_mounted()
  }

  pub fn is_loading(&self) -> bool {
    self.state.read().loading
  }

  pub fn error(&self) -> Option<String> {
    self.state.read().error.clone()
  }

  pub fn course(&self) -> Option<Course> {
    self.state.read().course.as_ref().map(|(c, _)| c.clone())
  }

  pub fn selection(&self) -> Selection {
    self.state.read().selection.clone()
  }

  /// Listed and selling price of the current selection, before any coupon.
  pub fn price(&self) -> Price {
    self.state.read().selection.price()
  }

  /// What "Buy Now" would charge.
  pub fn payable(&self) -> Rupees {
    self.state.read().coupon.final_price()
  }

  pub fn coupon(&self) -> CouponState {
    self.state.read().coupon.clone()
  }

  /// Loads a standalone (or faculty) course by id.
  #[instrument(name = "CourseDetailView::load_course", skip(self))]
  pub async fn load_course(&self, course_id: &str, course_type: CourseType) -> Result<()> {
    self.begin_loading();
    let result = self.api.course_details(course_id, course_type).await;
    self.finish_loading(result.map(|course| {
      let course_ref = CourseRef::for_course(&course);
      (course, course_ref)
    }))
  }

  /// Loads the course at `course_index` of a faculty's list.
  #[instrument(name = "CourseDetailView::load_faculty_course", skip(self))]
  pub async fn load_faculty_course(&self, faculty_slug: &str, course_index: usize) -> Result<()> {
    self.begin_loading();
    let result = self.api.faculty_courses(faculty_slug).await.and_then(|courses| {
      let course = courses.into_iter().nth(course_index).ok_or_else(|| ApiError::Status {
        status: 404,
        message: "Course not found".to_string(),
      })?;
      let course_ref = CourseRef::for_faculty_course(&course, faculty_slug, course_index);
      Ok((course, course_ref))
    });
    self.finish_loading(result)
  }

  /// Returns the new mode's attempts. Clears the attempt, the price and any
  /// coupon.
  pub fn select_mode(&self, mode: &str) -> Vec<AttemptPrice> {
    let mut state = self.state.write();
    let ViewState {
      course,
      selection,
      coupon,
      ..
    } = &mut *state;
    let Some((course, _)) = course.as_ref() else {
      return Vec::new();
    };
    let attempts = selection.select_mode(course, mode).to_vec();
    coupon.rebase(selection.price().final_price);
    attempts
  }

  pub fn select_attempt(&self, attempt: &str) -> bool {
    let mut state = self.state.write();
    let ViewState {
      course,
      selection,
      coupon,
      ..
    } = &mut *state;
    let Some((course, _)) = course.as_ref() else {
      return false;
    };
    let selected = selection.select_attempt(course, attempt);
    coupon.rebase(selection.price().final_price);
    selected
  }

  /// Applies `code` to the current selling price. The outcome is recorded
  /// only if the view is still mounted and the price has not changed in the
  /// meantime.
  pub async fn apply_coupon(&self, code: &str) -> CouponOutcome {
    let base = self.state.read().selection.price().final_price;
    let outcome = self.coupons.apply_coupon(code, base).await;
    if self.mount.is_mounted() {
      self.state.write().coupon.record(outcome.clone());
    }
    outcome
  }

  pub fn clear_coupon(&self) {
    self.state.write().coupon.clear();
  }

  pub fn buy_now(&self) -> Result<CheckoutState> {
    let (course_ref, selection, coupon) = {
      let state = self.state.read();
      let Some((_, course_ref)) = state.course.as_ref() else {
        return Err(CheckoutError::Validation("Course is still loading".to_string()));
      };
      (course_ref.clone(), state.selection.clone(), state.coupon.clone())
    };
    self.checkout.buy_now(&course_ref, &selection, Some(&coupon))
  }

  /// Restores the selection carried through login and reopens checkout.
  pub fn resume_after_login(&self, pending: &PendingPurchase) -> Result<CheckoutState> {
    let course = {
      let mut state = self.state.write();
      let Some((course, _)) = state.course.clone() else {
        return Err(CheckoutError::Validation("Course is still loading".to_string()));
      };
      ensure_same_course(pending, &course)?;
      state.selection = Selection::restore(&course, &pending.mode, &pending.attempt);
      let base = state.selection.price().final_price;
      state.coupon.rebase(base);
      course
    };
    self.checkout.resume_after_login(pending, &course)
  }

  /// The page was left. Pending loads, coupon checks and payment results are
  /// dropped from here on.
  pub fn unmount(&self) {
    self.checkout.unmount();
  }

  fn begin_loading(&self) {
    let mut state = self.state.write();
    state.loading = true;
    state.error = None;
  }

  fn finish_loading(&self, result: std::result::Result<(Course, CourseRef), ApiError>) -> Result<()> {
    if !self.mount.is_mounted() {
      event!(Level::DEBUG, "View unmounted, course load discarded.");
      return result.map(|_| ()).map_err(CheckoutError::from);
    }
    let mut state = self.state.write();
    state.loading = false;
    match result {
      Ok((course, course_ref)) => {
        let selection = Selection::default_for(&course);
        state.coupon = CouponState::new(selection.price().final_price);
        state.selection = selection;
        event!(Level::INFO, course = course.display_title(), modes = course.modes().len(), "Course loaded.");
        state.course = Some((course, course_ref));
        Ok(())
      }
      Err(e) => {
        event!(Level::WARN, error = %e, "Course load failed.");
        let err = CheckoutError::from(e);
        state.error = Some(err.user_message());
        Err(err)
      }
    }
  }
}
