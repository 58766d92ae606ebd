// coursecart/src/conditional/builder.rs

//! Fluent builder for routed steps.
//!
//! ```ignore
//! pipeline
//!   .routes_for_step("process_payment")?
//!   .route("razorpay", razorpay_pipeline, |ctx| extract_razorpay(ctx))
//!   .when(|ctx| ctx.read().method == PaymentMethod::Razorpay)
//!   .route("upi", upi_pipeline, |ctx| extract_upi(ctx))
//!   .when(|ctx| ctx.read().method == PaymentMethod::Upi)
//!   .if_unmatched(Unmatched::Fail)
//!   .finalize(false);
//! ```

use crate::conditional::scope::{AnyRoute, RouteScope};
use crate::error::FlowError;
use crate::flow::{ContextData, Handler, StepControl};
use crate::pipeline::Pipeline;
use std::sync::Arc;
use tracing::{event, Level};

/// What a routed step does when no route's condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmatched {
  Continue,
  Halt,
  /// Fail the run with `FlowError::NoRouteMatched`.
  Fail,
}

pub struct RouteBuilder<'pipeline, TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: &'pipeline mut Pipeline<TData, Err>,
  step_name: String,
  routes: Vec<Arc<dyn AnyRoute<TData, Err>>>,
  unmatched: Unmatched,
}

impl<'pipeline, TData, Err> RouteBuilder<'pipeline, TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) fn new(pipeline: &'pipeline mut Pipeline<TData, Err>, step_name: String) -> Self {
    Self {
      pipeline,
      step_name,
      routes: Vec::new(),
      unmatched: Unmatched::Continue,
    }
  }

  /// Adds a route running `route_pipeline` on the sub-context found by
  /// `extractor`. Finish it with [`RouteConfigurator::when`].
  pub fn route<SData>(
    self,
    label: impl Into<String>,
    route_pipeline: Arc<Pipeline<SData, Err>>,
    extractor: impl Fn(&ContextData<TData>) -> Result<ContextData<SData>, FlowError> + Send + Sync + 'static,
  ) -> RouteConfigurator<'pipeline, TData, SData, Err>
  where
    SData: 'static + Send + Sync,
  {
    RouteConfigurator {
      builder: self,
      label: label.into(),
      pipeline: route_pipeline,
      extractor: Arc::new(extractor),
    }
  }

  pub fn if_unmatched(mut self, behavior: Unmatched) -> Self {
    self.unmatched = behavior;
    self
  }

  /// Installs the routing handler as the step's only `on` handler.
  ///
  /// When `optional` is true a failing route is logged and the parent
  /// pipeline continues.
  pub fn finalize(self, optional: bool) {
    let routes = Arc::new(self.routes);
    let unmatched = self.unmatched;
    let step_name = self.step_name.clone();

    let handler: Handler<TData, Err> = Box::new(move |ctx_data: ContextData<TData>| {
      let routes = routes.clone();
      let step_name = step_name.clone();
      Box::pin(async move {
        let Some(route) = routes.iter().find(|r| r.is_match(&ctx_data)) else {
          event!(Level::DEBUG, %step_name, ?unmatched, "No route matched.");
          return match unmatched {
            Unmatched::Continue => Ok(StepControl::Continue),
            Unmatched::Halt => Ok(StepControl::Halt),
            Unmatched::Fail => Err(Err::from(FlowError::NoRouteMatched { step_name })),
          };
        };
        event!(Level::DEBUG, %step_name, route = route.label(), "Route matched.");
        match route.run_route(&step_name, ctx_data.clone()).await {
          Ok(control) => Ok(control),
          Err(e) if optional => {
            event!(Level::WARN, %step_name, error = %e, "Optional routed step failed, continuing.");
            Ok(StepControl::Continue)
          }
          Err(e) => Err(e),
        }
      })
    });

    if let Some(step) = self.pipeline.steps.iter_mut().find(|s| s.name == self.step_name) {
      step.optional = optional;
    }
    self.pipeline.set_on_handler(&self.step_name, handler);
    event!(Level::DEBUG, step_name = %self.step_name, "Routed step finalized.");
  }
}

pub struct RouteConfigurator<'pipeline, TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  builder: RouteBuilder<'pipeline, TData, Err>,
  label: String,
  pipeline: Arc<Pipeline<SData, Err>>,
  extractor: crate::conditional::scope::Extractor<TData, SData>,
}

impl<'pipeline, TData, SData, Err> RouteConfigurator<'pipeline, TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn when(
    mut self,
    condition: impl Fn(&ContextData<TData>) -> bool + Send + Sync + 'static,
  ) -> RouteBuilder<'pipeline, TData, Err> {
    self.builder.routes.push(Arc::new(RouteScope {
      label: self.label,
      pipeline: self.pipeline,
      extractor: self.extractor,
      condition: Arc::new(condition),
    }));
    self.builder
  }
}
