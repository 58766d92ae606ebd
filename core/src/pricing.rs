// coursecart/src/pricing.rs

//! Mode → attempt → price resolution.
//!
//! Lookups are exact string matches against the course's normalized pricing
//! ([`Course::modes`]), so tiered and legacy flat courses resolve the same
//! way. Nothing here returns an error: an unknown mode or attempt degrades to
//! an empty attempt list and a zero price, logged at `WARN`.

use crate::model::{AttemptPrice, Course, Price};
use tracing::{event, Level};

/// Attempts offered for `mode`, or an empty slice when the course has no such
/// mode.
pub fn attempts_for<'c>(course: &'c Course, mode: &str) -> &'c [AttemptPrice] {
  match course.find_mode(mode) {
    Some(pricing) => &pricing.attempts,
    None => {
      event!(
        Level::WARN,
        course = course.display_title(),
        mode,
        available = ?course.mode_names().collect::<Vec<_>>(),
        "Mode not offered for course."
      );
      &[]
    }
  }
}

/// The `(cost, selling)` price of `attempt` under `mode`.
pub fn price_for(course: &Course, mode: &str, attempt: &str) -> Option<Price> {
  course
    .find_mode(mode)?
    .attempts
    .iter()
    .find(|a| a.attempt == attempt)
    .map(|a| Price::new(a.cost_price, a.selling_price))
}

/// The student's current mode/attempt choice and the price it resolves to.
///
/// The price is only ever set together with a resolved attempt, and changing
/// the mode always drops the attempt, so a selection never pairs an attempt
/// with a mode it does not belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
  mode: Option<String>,
  attempt: Option<String>,
  price: Price,
}

impl Selection {
  pub fn empty() -> Self {
    Self::default()
  }

  /// First mode and its first attempt, or an empty selection when the course
  /// has no pricing at all.
  pub fn default_for(course: &Course) -> Self {
    let mut selection = Self::empty();
    let Some(first) = course.modes().first() else {
      event!(Level::WARN, course = course.display_title(), "Course has no pricing modes.");
      return selection;
    };
    selection.select_mode(course, &first.mode);
    if let Some(attempt) = first.attempts.first() {
      selection.select_attempt(course, &attempt.attempt);
    }
    selection
  }

  /// Rebuilds a selection from labels carried elsewhere (for example through
  /// the login redirect). Labels that no longer resolve are left unselected.
  pub fn restore(course: &Course, mode: &str, attempt: &str) -> Self {
    let mut selection = Self::empty();
    selection.select_mode(course, mode);
    selection.select_attempt(course, attempt);
    selection
  }

  pub fn mode(&self) -> Option<&str> {
    self.mode.as_deref()
  }

  pub fn attempt(&self) -> Option<&str> {
    self.attempt.as_deref()
  }

  pub fn price(&self) -> Price {
    self.price
  }

  /// Sets the mode, clears the attempt and zeroes the price. Reselecting the
  /// current mode clears the attempt too. Returns the mode's attempts.
  pub fn select_mode<'c>(&mut self, course: &'c Course, mode: &str) -> &'c [AttemptPrice] {
    self.mode = Some(mode.to_string());
    self.attempt = None;
    self.price = Price::ZERO;
    attempts_for(course, mode)
  }

  /// Selects `attempt` under the current mode. Returns `false`, leaving the
  /// attempt unselected and the price zero, when there is no mode yet or the
  /// attempt is not offered for it.
  pub fn select_attempt(&mut self, course: &Course, attempt: &str) -> bool {
    let Some(mode) = self.mode.as_deref() else {
      event!(Level::WARN, attempt, "Attempt selected before a mode.");
      return false;
    };
    match price_for(course, mode, attempt) {
      Some(price) => {
        self.attempt = Some(attempt.to_string());
        self.price = price;
        true
      }
      None => {
        event!(
          Level::WARN,
          course = course.display_title(),
          mode,
          attempt,
          "Attempt not offered for mode."
        );
        self.attempt = None;
        self.price = Price::ZERO;
        false
      }
    }
  }

  /// Both a mode and an attempt are chosen.
  pub fn is_complete(&self) -> bool {
    self.mode.is_some() && self.attempt.is_some()
  }

  /// Complete and priced above zero.
  pub fn has_valid_price(&self) -> bool {
    self.is_complete() && !self.price.final_price.is_zero()
  }
}
