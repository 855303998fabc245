// ============================================================================
// Inventory Domain - Variant stock and availability
// ============================================================================
//
// - Value objects (Variant, DateRange, Reservation, OverlapPolicy)
// - Availability calculator (overlap sum, peak usage sweep)
// - Repository (variants and reservations tables)
// - Service (admin upsert, availability reads)
//
// ============================================================================

pub mod availability;
pub mod repository;
pub mod service;
pub mod value_objects;

pub use availability::{AvailabilityCalculator, PeakUsage};
pub use service::InventoryService;
pub use value_objects::*;
