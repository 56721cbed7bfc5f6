//! Framework-agnostic entities for the order lifecycle.

pub mod order;
pub mod revenue;
pub mod shipping;
pub mod store;

pub use order::{Buyer, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, ProductSummary};
pub use shipping::{PackageProfile, RateRequest, ShippingQuote};
pub use store::{
    CategoryLink, Currency, EmailCapability, EmailCopy, EmailSettings, Product, Store,
    StoreBranding,
};
