// coursecart/src/checkout/details.rs

use crate::api::DetailsUpdate;
use crate::error::{CheckoutError, Result};
use crate::model::User;
use crate::provider::Customer;

/// The contact form shown before payment.
///
/// Prefilled from the profile. Once a phone number came from the profile it
/// is locked for the rest of the checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutDetails {
  full_name: String,
  email: String,
  phone: String,
  phone_locked: bool,
}

impl CheckoutDetails {
  pub fn prefilled(user: &User) -> Self {
    let phone = user.mobile.trim().to_string();
    Self {
      full_name: user.name.trim().to_string(),
      email: user.email.trim().to_string(),
      phone_locked: !phone.is_empty(),
      phone,
    }
  }

  pub fn full_name(&self) -> &str {
    &self.full_name
  }

  pub fn email(&self) -> &str {
    &self.email
  }

  pub fn phone(&self) -> &str {
    &self.phone
  }

  pub fn is_phone_locked(&self) -> bool {
    self.phone_locked
  }

  pub fn set_full_name(&mut self, value: impl Into<String>) {
    self.full_name = value.into();
  }

  pub fn set_email(&mut self, value: impl Into<String>) {
    self.email = value.into();
  }

  pub fn set_phone(&mut self, value: impl Into<String>) -> Result<()> {
    if self.phone_locked {
      return Err(CheckoutError::Validation(
        "Phone number is linked to your account and cannot be changed here".to_string(),
      ));
    }
    self.phone = value.into();
    Ok(())
  }

  /// Every field must be non-empty after trimming.
  pub fn validate(&self) -> Result<()> {
    let missing: Vec<&str> = [
      ("full name", &self.full_name),
      ("email", &self.email),
      ("phone", &self.phone),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(label, _)| label)
    .collect();

    if missing.is_empty() {
      Ok(())
    } else {
      Err(CheckoutError::Validation(format!(
        "Please fill in all required fields: {}",
        missing.join(", ")
      )))
    }
  }

  /// The editable fields differ from what the profile holds.
  pub fn differs_from(&self, user: &User) -> bool {
    self.full_name.trim() != user.name.trim() || self.email.trim() != user.email.trim()
  }

  pub fn to_update(&self) -> DetailsUpdate {
    DetailsUpdate {
      name: self.full_name.trim().to_string(),
      email: self.email.trim().to_string(),
    }
  }

  pub fn customer(&self) -> Customer {
    Customer {
      name: self.full_name.trim().to_string(),
      email: self.email.trim().to_string(),
      contact: self.phone.trim().to_string(),
    }
  }
}
