pub mod models;
pub mod rules;

pub use models::{Discount, Offer, OfferValidationError};
pub use rules::{AppliedDiscount, DiscountEvaluator, DiscountLine, DiscountRejection, DiscountSource};
