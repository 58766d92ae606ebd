// coursecart/src/model/user.rs
use serde::{Deserialize, Serialize};

/// The signed-in student, as held by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  #[serde(rename = "_id", alias = "id")]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default, alias = "phone")]
  pub mobile: String,
}

impl User {
  pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>, mobile: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      email: email.into(),
      mobile: mobile.into(),
    }
  }
}
