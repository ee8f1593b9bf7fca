pub mod models;
pub mod status;
pub mod cart;
pub mod manager;

pub use models::{Cart, CartItem, Order, OrderItem, PricingTotals, ShippingAddress, StatusChange};
pub use status::{OrderStatus, TransitionPolicy};
pub use cart::{CartError, PricingRules};
pub use manager::{OrderError, OrderManager};
