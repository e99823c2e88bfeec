pub mod models;
pub mod lifecycle;

pub use models::{LineConfiguration, NewOrder, Order, OrderError, OrderItem, ShippingAddress};
pub use lifecycle::OrderStatus;
