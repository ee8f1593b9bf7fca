pub mod events;

pub use events::VisitEvent;
