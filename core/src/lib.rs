// src/lib.rs

//! coursecart: the purchase side of a CA/CMA course marketplace client.
//!
//! The crate is headless. It resolves prices, applies coupons, runs the
//! checkout against a payment provider and reconciles what a student already
//! owns, exposing view-model state and navigation intents for a host UI to
//! render.
//!
//!  - [`pricing`]: mode → attempt → price selection over tiered and legacy
//!    flat pricing.
//!  - [`coupon`]: server-validated coupon discounts.
//!  - [`checkout`]: the guarded checkout state machine and the step pipeline
//!    each payment attempt runs.
//!  - [`reconciler`]: per-course purchase status for a faculty page.
//!  - [`provider`]: the payment-provider seam and the Razorpay adapter.
//!  - [`api`]: the REST client everything above talks through.
//!
//! The step pipeline engine (`flow`, `pipeline`, `conditional`) is generic:
//! named steps with before/on/after handlers, skip conditions, optional
//! steps, early halt and routed sub-pipelines.

pub mod api;
pub mod checkout;
pub mod conditional;
pub mod config;
pub mod coupon;
pub mod error;
pub mod flow;
pub mod model;
pub mod navigation;
pub mod pipeline;
pub mod pricing;
pub mod provider;
pub mod reconciler;
pub mod session;
pub mod view;

// --- Pipeline engine ---
pub use crate::conditional::{RouteBuilder, Unmatched};
pub use crate::flow::{ContextData, FlowOutcome, Handler, SkipCondition, StepControl, StepDef};
pub use crate::pipeline::Pipeline;

// --- Purchase flow ---
pub use crate::api::{CourseApi, HttpCourseApi};
pub use crate::checkout::{CheckoutDetails, CheckoutOrchestrator, CheckoutState};
pub use crate::config::ClientConfig;
pub use crate::coupon::{CouponApplier, CouponOutcome, CouponState};
pub use crate::navigation::{MountGuard, Navigator, Route};
pub use crate::pricing::Selection;
pub use crate::provider::{PaymentGateway, ProviderEvent, ProviderEventSink, RazorpayGateway};
pub use crate::reconciler::{CourseAction, PurchaseStatusMap, PurchaseStatusReconciler};
pub use crate::session::SessionStore;
pub use crate::view::CourseDetailView;

pub use crate::error::{ApiError, CheckoutError, FlowError, FlowResult, Result};
