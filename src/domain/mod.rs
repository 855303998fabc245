// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each domain has its own subdirectory with value objects, a repository
// over its tables and a service. Orders and bookings also carry journal
// events and a lifecycle binding (aggregate.rs).
//
// ============================================================================

pub mod booking;
pub mod cart;
pub mod inventory;
pub mod order;
