// coursecart/src/model/mod.rs

//! Data types shared across the crate: courses and their pricing, money,
//! users and purchase records.

pub mod course;
pub mod money;
pub mod purchase;
pub mod user;

pub use course::{AttemptPrice, Category, Course, CourseRef, CourseType, FlatPricing, ModePricing, PricingModel, Subcategory};
pub use money::{Paise, Price, Rupees};
pub use purchase::{
  PaymentMethod, PendingPurchase, PurchaseReceipt, PurchaseRecordRequest, UpiPurchaseRequest, Verification,
};
pub use user::User;
