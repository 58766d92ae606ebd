// coursecart/src/reconciler.rs

//! Which of a faculty's courses the signed-in student already owns.
//!
//! One status query per course index, all in flight together. A failed
//! query only affects its own index.

use crate::api::CourseApi;
use crate::error::Result;
use crate::model::{Course, CourseRef, User};
use crate::navigation::Route;
use crate::session::SessionStore;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Course index → purchased.
pub type PurchaseStatusMap = BTreeMap<usize, bool>;

/// The call to action a course card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAction {
  AccessCourse,
  ViewDetails,
}

impl CourseAction {
  pub fn for_status(purchased: bool) -> Self {
    if purchased {
      CourseAction::AccessCourse
    } else {
      CourseAction::ViewDetails
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      CourseAction::AccessCourse => "Access Course",
      CourseAction::ViewDetails => "View Details",
    }
  }

  pub fn route(self, course: CourseRef) -> Route {
    match self {
      CourseAction::AccessCourse => Route::Dashboard,
      CourseAction::ViewDetails => Route::CourseDetails { course },
    }
  }
}

#[derive(Clone)]
pub struct PurchaseStatusReconciler {
  api: Arc<dyn CourseApi>,
  session: Arc<SessionStore>,
}

impl PurchaseStatusReconciler {
  pub fn new(api: Arc<dyn CourseApi>, session: Arc<SessionStore>) -> Self {
    Self { api, session }
  }

  /// Statuses for indices `0..course_count` of `faculty_slug`, for whoever is
  /// signed in now.
  pub async fn reconcile(&self, faculty_slug: &str, course_count: usize) -> PurchaseStatusMap {
    let user = self.session.current_user();
    self.reconcile_for(user.as_ref(), faculty_slug, course_count).await
  }

  /// Without a user every index is `false` and nothing is queried.
  #[instrument(name = "PurchaseStatusReconciler::reconcile", skip(self, user), fields(signed_in = user.is_some()))]
  pub async fn reconcile_for(&self, user: Option<&User>, faculty_slug: &str, course_count: usize) -> PurchaseStatusMap {
    let Some(user) = user else {
      return (0..course_count).map(|index| (index, false)).collect();
    };

    let queries = (0..course_count).map(|index| {
      let api = self.api.clone();
      let user_id = user.id.clone();
      async move {
        let purchased = match api.check_purchase(&user_id, faculty_slug, index).await {
          Ok(purchased) => purchased,
          Err(e) => {
            event!(Level::WARN, course_index = index, error = %e, "Purchase status query failed, treating as not purchased.");
            false
          }
        };
        (index, purchased)
      }
    });

    let statuses: PurchaseStatusMap = join_all(queries).await.into_iter().collect();
    event!(
      Level::DEBUG,
      purchased = statuses.values().filter(|p| **p).count(),
      total = course_count,
      "Purchase statuses resolved."
    );
    statuses
  }

  /// Fetches a faculty's course list together with the statuses.
  pub async fn load_catalog(&self, faculty_slug: &str) -> Result<FacultyCatalog> {
    let courses = self.api.faculty_courses(faculty_slug).await?;
    let statuses = self.reconcile(faculty_slug, courses.len()).await;
    Ok(FacultyCatalog {
      faculty_slug: faculty_slug.to_string(),
      courses,
      statuses,
    })
  }
}

/// A faculty page: its courses in display order and what the student owns.
#[derive(Debug, Clone)]
pub struct FacultyCatalog {
  pub faculty_slug: String,
  pub courses: Vec<Course>,
  pub statuses: PurchaseStatusMap,
}

impl FacultyCatalog {
  pub fn is_purchased(&self, course_index: usize) -> bool {
    self.statuses.get(&course_index).copied().unwrap_or(false)
  }

  pub fn course_action(&self, course_index: usize) -> CourseAction {
    CourseAction::for_status(self.is_purchased(course_index))
  }

  /// Where the card's button leads, or `None` for an index past the list.
  pub fn route_for(&self, course_index: usize) -> Option<Route> {
    let course = self.courses.get(course_index)?;
    let course_ref = CourseRef::for_faculty_course(course, &self.faculty_slug, course_index);
    Some(self.course_action(course_index).route(course_ref))
  }
}
