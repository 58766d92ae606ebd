// coursecart/src/model/course.rs

//! Course records.
//!
//! Two pricing shapes exist in the catalogue: the nested
//! `modeAttemptPricing` list and the legacy flat `modes`/`durations` arrays
//! with one `costPrice`/`sellingPrice`. The wire record is decoded once into
//! [`Course`], whose [`PricingModel`] keeps the source shape and whose
//! [`Course::modes`] is always the normalized mode → attempt → price list.

use crate::model::money::Rupees;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
  #[serde(rename = "CA")]
  Ca,
  #[serde(rename = "CMA")]
  Cma,
}

impl Category {
  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_ascii_uppercase().as_str() {
      "CA" => Some(Category::Ca),
      "CMA" => Some(Category::Cma),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subcategory {
  Foundation,
  Inter,
  Final,
}

impl Subcategory {
  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "foundation" => Some(Subcategory::Foundation),
      "inter" | "intermediate" => Some(Subcategory::Inter),
      "final" => Some(Subcategory::Final),
      _ => None,
    }
  }
}

/// Whether a course belongs to a faculty page or is sold on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseType {
  #[default]
  Faculty,
  Standalone,
}

impl CourseType {
  pub fn as_query(self) -> &'static str {
    match self {
      CourseType::Faculty => "faculty",
      CourseType::Standalone => "standalone",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptPrice {
  #[serde(alias = "validity")]
  pub attempt: String,
  #[serde(default)]
  pub cost_price: Rupees,
  #[serde(default)]
  pub selling_price: Rupees,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModePricing {
  pub mode: String,
  #[serde(default)]
  pub attempts: Vec<AttemptPrice>,
}

/// Legacy flat pricing: every mode × duration costs the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatPricing {
  pub modes: Vec<String>,
  pub durations: Vec<String>,
  pub cost_price: Rupees,
  pub selling_price: Rupees,
}

impl FlatPricing {
  fn normalize(&self) -> Vec<ModePricing> {
    self
      .modes
      .iter()
      .map(|mode| {
        let labels: Vec<&str> = if self.durations.is_empty() {
          vec![mode.as_str()]
        } else {
          self.durations.iter().map(String::as_str).collect()
        };
        ModePricing {
          mode: mode.clone(),
          attempts: labels
            .into_iter()
            .map(|label| AttemptPrice {
              attempt: label.to_string(),
              cost_price: self.cost_price,
              selling_price: self.selling_price,
            })
            .collect(),
        }
      })
      .collect()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingModel {
  Tiered(Vec<ModePricing>),
  LegacyFlat(FlatPricing),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "CourseRecord")]
pub struct Course {
  pub id: Option<String>,
  pub title: String,
  pub subject: String,
  pub category: Option<Category>,
  pub subcategory: Option<Subcategory>,
  pub paper_id: Option<String>,
  pub faculty_slug: Option<String>,
  pub institute: Option<String>,
  pub course_type: CourseType,
  pub pricing: PricingModel,
  modes: Vec<ModePricing>,
}

impl Course {
  /// Normalized pricing, whatever the source shape.
  pub fn modes(&self) -> &[ModePricing] {
    &self.modes
  }

  pub fn mode_names(&self) -> impl Iterator<Item = &str> {
    self.modes.iter().map(|m| m.mode.as_str())
  }

  /// Exact, case-sensitive lookup.
  pub fn find_mode(&self, mode: &str) -> Option<&ModePricing> {
    self.modes.iter().find(|m| m.mode == mode)
  }

  pub fn is_legacy_priced(&self) -> bool {
    matches!(self.pricing, PricingModel::LegacyFlat(_))
  }

  pub fn display_title(&self) -> &str {
    if self.title.is_empty() {
      &self.subject
    } else {
      &self.title
    }
  }
}

/// The course record as the API sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseRecord {
  #[serde(rename = "_id", alias = "id")]
  id: Option<String>,
  #[serde(default)]
  title: Option<String>,
  #[serde(default)]
  subject: Option<String>,
  #[serde(default)]
  category: Option<String>,
  #[serde(default)]
  subcategory: Option<String>,
  #[serde(default)]
  paper_id: Option<JsonValue>,
  #[serde(default)]
  faculty_slug: Option<String>,
  #[serde(default)]
  institute: Option<JsonValue>,
  #[serde(default)]
  course_type: Option<CourseType>,
  #[serde(default)]
  mode_attempt_pricing: Option<Vec<ModePricing>>,
  #[serde(default)]
  cost_price: Option<Rupees>,
  #[serde(default)]
  selling_price: Option<Rupees>,
  #[serde(default)]
  modes: Option<Vec<String>>,
  #[serde(default)]
  durations: Option<Vec<String>>,
}

fn text_of(value: Option<JsonValue>) -> Option<String> {
  match value? {
    JsonValue::String(s) if !s.trim().is_empty() => Some(s),
    JsonValue::Number(n) => Some(n.to_string()),
    JsonValue::Object(map) => map.get("name").and_then(JsonValue::as_str).map(str::to_string),
    _ => None,
  }
}

impl From<CourseRecord> for Course {
  fn from(raw: CourseRecord) -> Self {
    let pricing = match raw.mode_attempt_pricing {
      Some(tiers) if !tiers.is_empty() => PricingModel::Tiered(tiers),
      _ => PricingModel::LegacyFlat(FlatPricing {
        modes: raw.modes.unwrap_or_default(),
        durations: raw.durations.unwrap_or_default(),
        cost_price: raw.cost_price.unwrap_or_default(),
        selling_price: raw.selling_price.unwrap_or_default(),
      }),
    };
    let modes = match &pricing {
      PricingModel::Tiered(tiers) => tiers.clone(),
      PricingModel::LegacyFlat(flat) => flat.normalize(),
    };
    let subject = raw.subject.unwrap_or_default();
    let course_type = raw.course_type.unwrap_or(if raw.faculty_slug.is_some() {
      CourseType::Faculty
    } else {
      CourseType::Standalone
    });

    Course {
      id: raw.id,
      title: raw.title.unwrap_or_else(|| subject.clone()),
      subject,
      category: raw.category.as_deref().and_then(Category::parse),
      subcategory: raw.subcategory.as_deref().and_then(Subcategory::parse),
      paper_id: text_of(raw.paper_id),
      faculty_slug: raw.faculty_slug.filter(|s| !s.is_empty()),
      institute: text_of(raw.institute),
      course_type,
      pricing,
      modes,
    }
  }
}

/// Identifies what is being bought: a course inside a faculty's list
/// (`faculty_slug` + `course_index`) or a standalone course (`course_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
  pub course_id: Option<String>,
  pub faculty_slug: Option<String>,
  pub course_index: Option<usize>,
  pub title: String,
}

impl CourseRef {
  pub fn for_faculty_course(course: &Course, faculty_slug: impl Into<String>, course_index: usize) -> Self {
    Self {
      course_id: course.id.clone(),
      faculty_slug: Some(faculty_slug.into()),
      course_index: Some(course_index),
      title: course.display_title().to_string(),
    }
  }

  pub fn for_course(course: &Course) -> Self {
    Self {
      course_id: course.id.clone(),
      faculty_slug: course.faculty_slug.clone(),
      course_index: None,
      title: course.display_title().to_string(),
    }
  }

  /// True when this reference was taken from `course`.
  pub fn refers_to(&self, course: &Course) -> bool {
    self.course_id == course.id
  }
}
