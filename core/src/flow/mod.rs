// coursecart/src/flow/mod.rs

//! Building blocks shared by the step pipeline: lockable context data,
//! handler signatures, step definitions and flow signals.

pub mod context_data;
pub mod control;
pub mod step;

pub use context_data::ContextData;
pub use control::{FlowOutcome, StepControl};
pub use step::{SkipCondition, StepDef};

use std::future::Future;
use std::pin::Pin;

/// A boxed async step handler over `ContextData<TData>`.
///
/// Handlers must release their lock guards before awaiting.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>> + Send + Sync,
>;
