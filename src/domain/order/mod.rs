// ============================================================================
// Order Domain - Rental orders and their lifecycle
// ============================================================================
//
// - Value objects (OrderStatus, OrderLine, Order)
// - Events (OrderPlaced, OrderStatusChanged, ...)
// - Aggregate (lifecycle binding and the stock release hook)
// - Repository (orders table)
// - Service (checkout, cancel, payment, admin status updates)
//
// ============================================================================

pub mod aggregate;
pub mod events;
pub mod repository;
pub mod service;
pub mod value_objects;

pub use aggregate::StockReleaseHook;
pub use events::*;
pub use service::OrderService;
pub use value_objects::*;
