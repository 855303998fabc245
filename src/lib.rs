//! Wedding-dress rental inventory with order and photography booking
//! lifecycles, served over HTTP.

pub mod actor;
pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod health;
pub mod journal;
pub mod lifecycle;
pub mod metrics;
pub mod payment;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, EngineResult};
