// coursecart/src/model/money.rs

//! Rupee amounts, the paise unit the payment provider expects, and the
//! `(original, final)` price pair shown on course cards.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::{event, Level};

/// Whole rupees. Course prices and purchase amounts travel in this unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rupees(pub u64);

/// Minor currency units (1/100 rupee). Only the payment provider sees these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Paise(pub u64);

impl Rupees {
  pub const ZERO: Rupees = Rupees(0);

  pub fn to_paise(self) -> Paise {
    Paise(self.0.saturating_mul(100))
  }

  /// Applies a percentage discount and rounds to the nearest rupee.
  /// Percentages outside `0..=100` are clamped.
  pub fn discounted_by(self, percent: f64) -> Rupees {
    let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
    let value = (self.0 as f64 * (1.0 - percent / 100.0)).round();
    Rupees(value.max(0.0) as u64)
  }

  pub fn is_zero(self) -> bool {
    self.0 == 0
  }
}

impl fmt::Display for Rupees {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "₹{}", self.0)
  }
}

impl fmt::Display for Paise {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} paise", self.0)
  }
}

// Prices arrive as integers, floats, numeric strings, blanks or nulls
// depending on which admin form wrote the record. Anything that is not a
// usable non-negative amount decodes as zero.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireAmount {
  Int(u64),
  Float(f64),
  Text(String),
  Other(IgnoredAny),
}

impl WireAmount {
  fn to_rupees(&self) -> Option<u64> {
    let usable = |v: f64| v.is_finite() && v >= 0.0;
    match self {
      WireAmount::Int(v) => Some(*v),
      WireAmount::Float(v) if usable(*v) => Some(v.round() as u64),
      WireAmount::Text(s) => {
        let s = s.trim();
        s.parse::<u64>()
          .ok()
          .or_else(|| s.parse::<f64>().ok().filter(|v| usable(*v)).map(|v| v.round() as u64))
      }
      _ => None,
    }
  }
}

impl<'de> Deserialize<'de> for Rupees {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let wire = WireAmount::deserialize(deserializer)?;
    match wire.to_rupees() {
      Some(v) => Ok(Rupees(v)),
      None => {
        let shown = match &wire {
          WireAmount::Text(s) => format!("{:?}", s),
          WireAmount::Float(v) => v.to_string(),
          _ => "non-numeric".to_string(),
        };
        event!(Level::WARN, amount = %shown, "Unusable price on the wire, treating it as zero.");
        Ok(Rupees::ZERO)
      }
    }
  }
}

/// The listed (`original`) and charged (`final_price`) price of a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Price {
  pub original: Rupees,
  pub final_price: Rupees,
}

impl Price {
  pub const ZERO: Price = Price {
    original: Rupees::ZERO,
    final_price: Rupees::ZERO,
  };

  pub fn new(original: Rupees, final_price: Rupees) -> Self {
    Self { original, final_price }
  }

  /// The "% off" badge: `floor((original - final) / original * 100)`.
  /// Zero when there is no listed price or no saving.
  pub fn discount_percent(&self) -> u32 {
    if self.original.is_zero() || self.final_price >= self.original {
      return 0;
    }
    let saving = (self.original.0 - self.final_price.0) as f64;
    (saving / self.original.0 as f64 * 100.0).floor() as u32
  }

  pub fn is_zero(&self) -> bool {
    self.original.is_zero() && self.final_price.is_zero()
  }
}
