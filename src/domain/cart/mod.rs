// ============================================================================
// Cart Domain - Per-user rental selections
// ============================================================================

pub mod repository;
pub mod service;
pub mod value_objects;

pub use service::CartService;
pub use value_objects::*;
