// coursecart/src/checkout/mod.rs

//! Checkout: the state machine, the contact form, the step pipeline that
//! runs a payment attempt and the orchestrator tying them to a view.

pub mod details;
pub mod orchestrator;
pub mod pipeline;
pub mod state;

pub use details::CheckoutDetails;
pub use orchestrator::CheckoutOrchestrator;
pub use pipeline::{build_checkout_pipeline, CheckoutCtxData, CheckoutDeps};
pub use state::{CheckoutEvent, CheckoutMachine, CheckoutState};
