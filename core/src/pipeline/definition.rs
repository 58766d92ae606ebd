// coursecart/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct and its construction.

use crate::conditional::builder::RouteBuilder;
use crate::error::{FlowError, FlowResult};
use crate::flow::{Handler, SkipCondition, StepDef};
use std::collections::HashMap;

/// An ordered list of named steps, each with `before`/`on`/`after` handlers,
/// run against a shared `ContextData<TData>`.
///
/// `Err` is what handlers return; it must absorb `FlowError` so engine-level
/// failures (a non-optional step with no handler, a failed route extraction)
/// surface through the same channel.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional, skip_if)` triples.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn ensure_step_exists(&self, step_name: &str) -> FlowResult<()> {
    if self.steps.iter().any(|s| s.name == step_name) {
      Ok(())
    } else {
      Err(FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })
    }
  }

  /// Turns `step_name` into a routed step: exactly one of the sub-pipelines
  /// registered on the returned builder runs, chosen by its condition.
  pub fn routes_for_step(&mut self, step_name: &str) -> FlowResult<RouteBuilder<'_, TData, Err>> {
    self.ensure_step_exists(step_name)?;
    Ok(RouteBuilder::new(self, step_name.to_string()))
  }
}
