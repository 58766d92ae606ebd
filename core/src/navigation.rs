// coursecart/src/navigation.rs

//! Navigation intents handed to the host, and the mount guard that stops
//! late async work from touching a view the student has left.

use crate::model::{CourseRef, PendingPurchase};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  /// Sign-in page. `pending` is carried as navigation state so checkout can
  /// resume after login.
  Login { pending: PendingPurchase },
  /// The student dashboard, where purchased courses are accessed.
  Dashboard,
  CourseDetails { course: CourseRef },
}

pub trait Navigator: Send + Sync {
  fn navigate(&self, route: Route);
}

/// Shared "is the view still mounted" flag.
///
/// Clones observe the same flag. Unmounting is one-way.
#[derive(Debug, Clone)]
pub struct MountGuard(Arc<AtomicBool>);

impl MountGuard {
  pub fn new() -> Self {
    MountGuard(Arc::new(AtomicBool::new(true)))
  }

  pub fn is_mounted(&self) -> bool {
    self.0.load(Ordering::Acquire)
  }

  pub fn unmount(&self) {
    self.0.store(false, Ordering::Release);
  }
}

impl Default for MountGuard {
  fn default() -> Self {
    Self::new()
  }
}
