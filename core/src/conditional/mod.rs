// coursecart/src/conditional/mod.rs

//! Routed steps: a step of a parent pipeline that runs one of several
//! sub-pipelines, picked by a condition on the parent context. The checkout
//! uses this to choose between the Razorpay and manual UPI payment paths.

pub mod builder;
pub(crate) mod scope;

pub use builder::{RouteBuilder, RouteConfigurator, Unmatched};
