// coursecart/src/conditional/scope.rs

//! One route of a routed step, plus the type-erased trait that lets routes
//! with different sub-context types live in one list.

use crate::error::FlowError;
use crate::flow::{ContextData, FlowOutcome, StepControl};
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, instrument, Level};

pub(crate) type Extractor<TData, SData> =
  Arc<dyn Fn(&ContextData<TData>) -> Result<ContextData<SData>, FlowError> + Send + Sync + 'static>;

pub(crate) type Condition<TData> = Arc<dyn Fn(&ContextData<TData>) -> bool + Send + Sync + 'static>;

/// A sub-pipeline over `SData`, the extractor that finds its context inside
/// the parent's `TData`, and the condition that selects it.
pub(crate) struct RouteScope<TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) label: String,
  pub(crate) pipeline: Arc<Pipeline<SData, Err>>,
  pub(crate) extractor: Extractor<TData, SData>,
  pub(crate) condition: Condition<TData>,
}

#[async_trait]
pub(crate) trait AnyRoute<TData, Err>: Send + Sync
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn label(&self) -> &str;

  fn is_match(&self, parent: &ContextData<TData>) -> bool;

  /// Extracts the sub-context and runs the route's pipeline on it. A halted
  /// sub-pipeline halts the parent.
  async fn run_route(&self, step_name: &str, parent: ContextData<TData>) -> Result<StepControl, Err>;
}

#[async_trait]
impl<TData, SData, Err> AnyRoute<TData, Err> for RouteScope<TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn label(&self) -> &str {
    &self.label
  }

  fn is_match(&self, parent: &ContextData<TData>) -> bool {
    (self.condition)(parent)
  }

  #[instrument(
    name = "AnyRoute::run_route",
    skip(self, parent),
    fields(route = %self.label, sub_context_type = %std::any::type_name::<SData>()),
    err(Display)
  )]
  async fn run_route(&self, step_name: &str, parent: ContextData<TData>) -> Result<StepControl, Err> {
    let sub_ctx = (self.extractor)(&parent).map_err(|err| {
      event!(Level::ERROR, error = %err, "Route extractor failed.");
      let err = match err {
        FlowError::HandlerError { source } | FlowError::RouteExtraction { source, .. } => FlowError::RouteExtraction {
          step_name: step_name.to_string(),
          source,
        },
        other => other,
      };
      Err::from(err)
    })?;

    match self.pipeline.run(sub_ctx).await? {
      FlowOutcome::Completed => {
        event!(Level::DEBUG, "Route pipeline completed.");
        Ok(StepControl::Continue)
      }
      FlowOutcome::Halted => {
        event!(Level::INFO, "Route pipeline halted.");
        Ok(StepControl::Halt)
      }
    }
  }
}
