// coursecart/src/config.rs

use crate::error::{CheckoutError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_RAZORPAY_SCRIPT_URL: &str = "https://checkout.razorpay.com/v1/checkout.js";
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(3_000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);

#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the REST API, without a trailing slash.
  pub api_url: String,
  pub razorpay_key_id: Option<String>,
  pub razorpay_script_url: String,
  /// Merchant name shown in the provider's checkout popup.
  pub brand_name: String,
  pub currency: String,
  /// Payee VPA for the manual UPI path. Without it the UPI URI cannot be built.
  pub upi_payee_vpa: Option<String>,
  pub upi_payee_name: String,
  /// How long the success screen shows before redirecting to the dashboard.
  pub redirect_delay: Duration,
  pub request_timeout: Duration,
}

impl ClientConfig {
  pub fn new(api_url: impl Into<String>) -> Self {
    Self {
      api_url: trim_base(api_url.into()),
      razorpay_key_id: None,
      razorpay_script_url: DEFAULT_RAZORPAY_SCRIPT_URL.to_string(),
      brand_name: "Exam Prep Courses".to_string(),
      currency: "INR".to_string(),
      upi_payee_vpa: None,
      upi_payee_name: "Exam Prep Courses".to_string(),
      redirect_delay: DEFAULT_REDIRECT_DELAY,
      request_timeout: DEFAULT_REQUEST_TIMEOUT,
    }
  }

  pub fn with_razorpay_key(mut self, key_id: impl Into<String>) -> Self {
    self.razorpay_key_id = Some(key_id.into());
    self
  }

  pub fn with_upi_payee(mut self, vpa: impl Into<String>, name: impl Into<String>) -> Self {
    self.upi_payee_vpa = Some(vpa.into());
    self.upi_payee_name = name.into();
    self
  }

  pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
    self.redirect_delay = delay;
    self
  }

  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());
    let millis = |var_name: &str, default: Duration| -> Result<Duration> {
      match get_env(var_name) {
        Some(raw) => raw
          .trim()
          .parse::<u64>()
          .map(Duration::from_millis)
          .map_err(|e| CheckoutError::Config(format!("Invalid {}: {}", var_name, e))),
        None => Ok(default),
      }
    };

    let mut config = Self::new(get_env("API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()));
    config.razorpay_key_id = get_env("RAZORPAY_KEY_ID");
    if let Some(url) = get_env("RAZORPAY_SCRIPT_URL") {
      config.razorpay_script_url = url;
    }
    if let Some(name) = get_env("CHECKOUT_BRAND_NAME") {
      config.upi_payee_name = name.clone();
      config.brand_name = name;
    }
    if let Some(currency) = get_env("CHECKOUT_CURRENCY") {
      config.currency = currency.to_ascii_uppercase();
    }
    config.upi_payee_vpa = get_env("UPI_PAYEE_VPA");
    if let Some(name) = get_env("UPI_PAYEE_NAME") {
      config.upi_payee_name = name;
    }
    config.redirect_delay = millis("REDIRECT_DELAY_MS", DEFAULT_REDIRECT_DELAY)?;
    config.request_timeout = millis("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT)?;

    if !config.api_url.starts_with("http://") && !config.api_url.starts_with("https://") {
      return Err(CheckoutError::Config(format!(
        "API_URL must be an http(s) URL, got '{}'",
        config.api_url
      )));
    }

    tracing::info!(api_url = %config.api_url, razorpay = config.razorpay_key_id.is_some(), "Client configuration loaded.");
    Ok(config)
  }

  /// The Razorpay key, or a configuration error when checkout is attempted
  /// without one.
  pub fn require_razorpay_key(&self) -> Result<&str> {
    self
      .razorpay_key_id
      .as_deref()
      .ok_or_else(|| CheckoutError::Config("RAZORPAY_KEY_ID is not set".to_string()))
  }
}

fn trim_base(mut url: String) -> String {
  while url.ends_with('/') {
    url.pop();
  }
  url
}
