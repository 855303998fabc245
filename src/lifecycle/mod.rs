mod handler;
mod machine;

pub use handler::{Authority, Lifecycle};
pub use machine::{LifecycleRecord, LifecycleStatus, ResourceHook};
