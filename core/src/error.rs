// coursecart/src/error.rs

use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Errors raised by the step pipeline itself rather than by a handler.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Route extraction failed for step '{step_name}'. Source: {source}")]
  RouteExtraction {
    step_name: String,
    #[source]
    source: AnyhowError,
  },

  #[error("No route matched for step '{step_name}'")]
  NoRouteMatched { step_name: String },

  #[error("Error in handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::HandlerError { source: err }
  }
}

/// Errors from the course-marketplace REST API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
  #[error("network error: {0}")]
  Network(String),

  #[error("request timed out")]
  Timeout,

  #[error("server returned {status}: {message}")]
  Status { status: u16, message: String },

  #[error("could not decode response: {0}")]
  Decode(String),

  /// The server answered 2xx with `success: false`.
  #[error("request rejected: {0}")]
  Rejected(String),
}

impl ApiError {
  /// The server-supplied message where there is one.
  pub fn server_message(&self) -> Option<&str> {
    match self {
      ApiError::Status { message, .. } | ApiError::Rejected(message) if !message.is_empty() => Some(message.as_str()),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      ApiError::Timeout
    } else if err.is_decode() {
      ApiError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
      ApiError::Status {
        status: status.as_u16(),
        message: err.to_string(),
      }
    } else {
      ApiError::Network(err.to_string())
    }
  }
}

/// Application-level error for the purchase flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Sign-in required")]
  Unauthenticated,

  #[error("API Error: {0}")]
  Api(#[from] ApiError),

  #[error("Payment Provider Error: {0}")]
  Provider(String),

  /// Funds were captured by the provider but the purchase record failed.
  /// There is no automatic reconciliation for this case.
  #[error("Payment {transaction_id} captured but not recorded: {message}")]
  PaymentNotRecorded { transaction_id: String, message: String },

  #[error("A payment is already in progress")]
  Busy,

  #[error("Cannot {action} while checkout is {state}")]
  InvalidTransition { action: &'static str, state: &'static str },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for CheckoutError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<ApiError>() {
      Ok(api_err) => CheckoutError::Api(api_err),
      Err(err) => CheckoutError::Internal(err.to_string()),
    }
  }
}

impl CheckoutError {
  /// A message fit to show the student.
  pub fn user_message(&self) -> String {
    match self {
      CheckoutError::Validation(m) => m.clone(),
      CheckoutError::Unauthenticated => "Please sign in to continue.".to_string(),
      CheckoutError::Api(e) => match e.server_message() {
        Some(m) => m.to_string(),
        None => "Something went wrong. Please try again.".to_string(),
      },
      CheckoutError::Provider(m) => format!("Payment failed: {}", m),
      CheckoutError::PaymentNotRecorded { transaction_id, .. } => format!(
        "Your payment ({}) was received but we could not activate the course. Please contact support with this payment id.",
        transaction_id
      ),
      CheckoutError::Busy => "Your payment is being processed.".to_string(),
      CheckoutError::InvalidTransition { .. }
      | CheckoutError::Config(_)
      | CheckoutError::Workflow { .. }
      | CheckoutError::Internal(_) => "Something went wrong. Please try again.".to_string(),
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
pub type Result<T, E = CheckoutError> = std::result::Result<T, E>;
