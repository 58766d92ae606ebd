// coursecart/src/flow/control.rs

//! Flow signals returned by step handlers and by a whole pipeline run.

/// Returned by a handler to continue the pipeline or halt it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  Continue,
  /// Stop immediately; no further handlers or steps run.
  Halt,
}

/// Outcome of a full pipeline run that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  Completed,
  Halted,
}
