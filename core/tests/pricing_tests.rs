// tests/pricing_tests.rs
mod common;

use common::*;
use coursecart::model::{Price, Rupees};
use coursecart::pricing::{attempts_for, price_for, Selection};

#[test]
fn test_every_listed_attempt_resolves_to_its_own_prices() {
  setup_tracing();
  let course = tiered_course();

  for mode in course.modes() {
    for attempt in &mode.attempts {
      let mut selection = Selection::empty();
      selection.select_mode(&course, &mode.mode);
      assert!(selection.select_attempt(&course, &attempt.attempt));
      assert_eq!(selection.price().original, attempt.cost_price);
      assert_eq!(selection.price().final_price, attempt.selling_price);
    }
  }
}

#[test]
fn test_live_at_home_twelve_months_shows_twelve_percent_badge() {
  setup_tracing();
  let course = tiered_course();
  let mut selection = Selection::empty();
  selection.select_mode(&course, "Live at Home");
  selection.select_attempt(&course, "12 Months");

  let price = selection.price();
  assert_eq!(price.final_price, Rupees(13999));
  assert_eq!(price.original, Rupees(15999));
  assert_eq!(price.final_price.to_string(), "₹13999");
  assert_eq!(price.discount_percent(), 12);
}

#[test]
fn test_changing_mode_always_clears_attempt() {
  setup_tracing();
  let course = tiered_course();
  let mut selection = Selection::default_for(&course);
  assert_eq!(selection.attempt(), Some("12 Months"));

  let attempts = selection.select_mode(&course, "Recorded Videos");
  assert_eq!(attempts.len(), 1);
  assert_eq!(selection.mode(), Some("Recorded Videos"));
  assert_eq!(selection.attempt(), None);
  assert_eq!(selection.price(), Price::ZERO);

  // Reselecting the same mode clears too.
  selection.select_attempt(&course, "Nov 2025");
  selection.select_mode(&course, "Recorded Videos");
  assert_eq!(selection.attempt(), None);
  assert!(!selection.is_complete());
}

#[test]
fn test_attempt_from_another_mode_is_rejected() {
  setup_tracing();
  let course = tiered_course();
  let mut selection = Selection::empty();
  selection.select_mode(&course, "Recorded Videos");

  assert!(!selection.select_attempt(&course, "12 Months"));
  assert_eq!(selection.attempt(), None);
  assert_eq!(selection.price(), Price::ZERO);
}

#[test]
fn test_unknown_mode_degrades_to_zero_price() {
  setup_tracing();
  let course = tiered_course();

  // Exact match only.
  assert!(attempts_for(&course, "live at home").is_empty());
  assert_eq!(price_for(&course, "Live at home", "12 Months"), None);

  let mut selection = Selection::empty();
  let attempts = selection.select_mode(&course, "Satellite");
  assert!(attempts.is_empty());
  assert!(!selection.select_attempt(&course, "12 Months"));
  assert!(!selection.has_valid_price());
  assert_eq!(selection.price(), Price::ZERO);
}

#[test]
fn test_attempt_before_mode_is_rejected() {
  setup_tracing();
  let course = tiered_course();
  let mut selection = Selection::empty();
  assert!(!selection.select_attempt(&course, "12 Months"));
  assert!(!selection.is_complete());
}

#[test]
fn test_legacy_flat_pricing_applies_uniformly() {
  setup_tracing();
  let course = legacy_course();
  assert!(course.is_legacy_priced());
  assert_eq!(course.mode_names().collect::<Vec<_>>(), vec!["Pendrive", "Google Drive"]);

  for mode in ["Pendrive", "Google Drive"] {
    let attempts = attempts_for(&course, mode);
    assert_eq!(
      attempts.iter().map(|a| a.attempt.as_str()).collect::<Vec<_>>(),
      vec!["May 2025", "Nov 2025"]
    );
    for attempt in ["May 2025", "Nov 2025"] {
      assert_eq!(
        price_for(&course, mode, attempt),
        Some(Price::new(Rupees(12000), Rupees(9999)))
      );
    }
  }
}

#[test]
fn test_legacy_course_without_durations_uses_mode_as_attempt() {
  setup_tracing();
  let course: coursecart::model::Course = serde_json::from_value(serde_json::json!({
    "_id": "c-3",
    "subject": "Costing",
    "modes": ["Live"],
    "costPrice": 5000,
    "sellingPrice": 4500
  }))
  .unwrap();

  let selection = Selection::default_for(&course);
  assert_eq!(selection.mode(), Some("Live"));
  assert_eq!(selection.attempt(), Some("Live"));
  assert_eq!(selection.price().final_price, Rupees(4500));
}

#[test]
fn test_course_without_pricing_has_empty_default_selection() {
  setup_tracing();
  let course: coursecart::model::Course =
    serde_json::from_value(serde_json::json!({ "_id": "c-4", "subject": "Law" })).unwrap();

  let selection = Selection::default_for(&course);
  assert_eq!(selection, Selection::empty());
  assert!(!selection.has_valid_price());
}

#[test]
fn test_restore_drops_labels_that_no_longer_exist() {
  setup_tracing();
  let course = tiered_course();

  let restored = Selection::restore(&course, "Live at Home", "6 Months");
  assert!(restored.has_valid_price());
  assert_eq!(restored.price().final_price, Rupees(8999));

  let stale = Selection::restore(&course, "Live at Home", "24 Months");
  assert_eq!(stale.mode(), Some("Live at Home"));
  assert_eq!(stale.attempt(), None);
}
