pub mod models;
pub mod pii;

pub use models::VisitEvent;
pub use pii::Masked;
