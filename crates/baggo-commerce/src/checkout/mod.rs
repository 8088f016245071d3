//! Checkout module.
//!
//! Contains shipping settings, orders, their dual-mode gateways and the
//! checkout flow that ties them to the cart.

mod flow;
mod order;
mod shipping;

pub use flow::{Checkout, CheckoutTotals, OrderDraft, OrderItem};
pub use order::{NewOrder, Order, OrderGateway, OrderStatus};
pub use shipping::{normalize_methods, ConfigGateway, ShippingMethod, ShippingSettings};
