// coursecart/src/pipeline/execution.rs

use crate::error::FlowError;
use crate::flow::{ContextData, FlowOutcome, Handler, StepControl};
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// A step is skipped when its `skip_if` holds, or when it is optional and
  /// has no handlers. A non-optional step without handlers fails the run with
  /// `FlowError::HandlerMissing`. The first handler returning
  /// `StepControl::Halt` ends the run with `FlowOutcome::Halted`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(context_type = %std::any::type_name::<TData>(), num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Pipeline run starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let span = tracing::info_span!("pipeline_step", step_name, step_index = step_idx);

      if step_def.should_skip(&ctx_data) {
        event!(parent: &span, Level::INFO, "Step skipped by condition.");
        continue;
      }

      let phases = [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ];
      let has_handlers = phases.iter().any(|(_, h)| h.map_or(false, |v| !v.is_empty()));
      if !has_handlers {
        if step_def.optional {
          event!(parent: &span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      for (phase, handlers) in phases {
        let Some(handlers) = handlers else { continue };
        let control = run_phase(handlers, &ctx_data, phase).instrument(span.clone()).await?;
        if control == StepControl::Halt {
          event!(parent: &span, Level::INFO, phase, "Pipeline halted by handler.");
          return Ok(FlowOutcome::Halted);
        }
      }
    }

    event!(Level::DEBUG, "Pipeline run completed.");
    Ok(FlowOutcome::Completed)
  }
}

async fn run_phase<TData, Err>(
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
  phase: &'static str,
) -> Result<StepControl, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler) in handlers.iter().enumerate() {
    match handler(ctx_data.clone()).await {
      Ok(StepControl::Continue) => {}
      Ok(StepControl::Halt) => return Ok(StepControl::Halt),
      Err(e) => {
        event!(Level::ERROR, phase, handler_index = handler_idx, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(StepControl::Continue)
}
