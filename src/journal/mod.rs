// ============================================================================
// Journal - Append-only audit trail of lifecycle events
// ============================================================================
//
// Generic over the event type; orders and bookings each journal their own
// event enum through the same store.
//
// ============================================================================

mod event;
mod store;

pub use event::{DomainEvent, EventEnvelope};
pub use store::{append, load};
