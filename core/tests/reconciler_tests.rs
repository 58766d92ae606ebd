// tests/reconciler_tests.rs
mod common;

use common::*;
use coursecart::navigation::Route;
use coursecart::reconciler::{CourseAction, PurchaseStatusReconciler};
use coursecart::session::SessionStore;
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_signed_out_student_owns_nothing_and_nothing_is_queried() {
  setup_tracing();
  let api = FakeApi::new();
  api.purchased.lock().insert(0);
  let reconciler = PurchaseStatusReconciler::new(api.clone(), Arc::new(SessionStore::new()));

  let statuses = reconciler.reconcile(FACULTY_SLUG, 3).await;

  assert_eq!(statuses.len(), 3);
  assert!(statuses.values().all(|purchased| !purchased));
  assert_eq!(FakeApi::calls(&api.check_calls), 0);
}

#[tokio::test]
#[serial]
async fn test_one_query_per_index() {
  setup_tracing();
  let api = FakeApi::new();
  api.purchased.lock().extend([1, 3]);
  let reconciler = PurchaseStatusReconciler::new(api.clone(), signed_in_session());

  let statuses = reconciler.reconcile(FACULTY_SLUG, 4).await;

  assert_eq!(FakeApi::calls(&api.check_calls), 4);
  assert_eq!(
    statuses.into_iter().collect::<Vec<_>>(),
    vec![(0, false), (1, true), (2, false), (3, true)]
  );
}

#[tokio::test]
#[serial]
async fn test_failed_query_does_not_affect_others() {
  setup_tracing();
  let api = FakeApi::new();
  api.purchased.lock().extend([0, 2]);
  api.failing_indices.lock().insert(0);
  let reconciler = PurchaseStatusReconciler::new(api.clone(), signed_in_session());

  let statuses = reconciler.reconcile(FACULTY_SLUG, 3).await;

  assert_eq!(statuses[&0], false);
  assert_eq!(statuses[&1], false);
  assert_eq!(statuses[&2], true);
}

#[tokio::test]
#[serial]
async fn test_catalog_routes_by_ownership() {
  setup_tracing();
  let api = FakeApi::with_courses(vec![tiered_course(), legacy_course()]);
  api.purchased.lock().insert(0);
  let reconciler = PurchaseStatusReconciler::new(api.clone(), signed_in_session());

  let catalog = reconciler.load_catalog(FACULTY_SLUG).await.unwrap();

  assert_eq!(catalog.course_action(0), CourseAction::AccessCourse);
  assert_eq!(catalog.course_action(0).label(), "Access Course");
  assert_eq!(catalog.route_for(0), Some(Route::Dashboard));

  assert_eq!(catalog.course_action(1), CourseAction::ViewDetails);
  match catalog.route_for(1) {
    Some(Route::CourseDetails { course }) => {
      assert_eq!(course.course_index, Some(1));
      assert_eq!(course.faculty_slug.as_deref(), Some(FACULTY_SLUG));
      assert_eq!(course.title, "Audit");
    }
    other => panic!("expected course details route, got {:?}", other),
  }
  assert_eq!(catalog.route_for(7), None);
}
