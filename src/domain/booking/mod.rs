// ============================================================================
// Booking Domain - Photography sessions and their lifecycle
// ============================================================================
//
// Shares the lifecycle handler with orders; the resource hook here guards
// slot exclusivity instead of stock.
//
// ============================================================================

pub mod aggregate;
pub mod events;
pub mod repository;
pub mod service;
pub mod value_objects;

pub use aggregate::SlotExclusivityHook;
pub use events::*;
pub use service::BookingService;
pub use value_objects::*;
