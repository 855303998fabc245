use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::domain::inventory::OverlapPolicy;
use crate::engine::EngineConfig;
use crate::utils::{CircuitBreakerConfig, RetryConfig};

/// Which sandbox behaviour the payment adapter runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SandboxMode {
    Approve,
    Decline,
    Unavailable,
}

/// Bridal rental engine configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "bridal_rental", about = "Bridal rental inventory and booking service", long_about = None)]
pub struct Config {
    /// SQLite connection string
    #[arg(long, env = "BRIDAL_DATABASE_URL", default_value = "sqlite://bridal_rental.db")]
    pub database_url: String,

    #[arg(long, env = "BRIDAL_DB_MAX_CONNECTIONS", default_value_t = 4)]
    pub db_max_connections: u32,

    /// HTTP listen address
    #[arg(long, env = "BRIDAL_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Whether a return day may be another rental's pickup day
    #[arg(long, env = "BRIDAL_OVERLAP_POLICY", value_enum, default_value_t = OverlapPolicy::Inclusive)]
    pub overlap_policy: OverlapPolicy,

    /// Per-attempt payment authorization timeout
    #[arg(long, env = "BRIDAL_PAYMENT_TIMEOUT_MS", default_value_t = 5_000)]
    pub payment_timeout_ms: u64,

    /// Attempts against an unavailable payment provider
    #[arg(long, env = "BRIDAL_PAYMENT_MAX_ATTEMPTS", default_value_t = 3)]
    pub payment_max_attempts: u32,

    /// Consecutive provider failures before the payment circuit opens
    #[arg(long, env = "BRIDAL_PAYMENT_BREAKER_THRESHOLD", default_value_t = 5)]
    pub payment_breaker_threshold: u32,

    #[arg(long, env = "BRIDAL_SANDBOX_PAYMENTS", value_enum, default_value_t = SandboxMode::Approve)]
    pub sandbox_payments: SandboxMode,
}

impl Config {
    pub fn load() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            overlap_policy: self.overlap_policy,
            payment_timeout: Duration::from_millis(self.payment_timeout_ms),
            payment_retry: RetryConfig {
                max_attempts: self.payment_max_attempts.max(1),
                ..RetryConfig::default()
            },
            payment_breaker: CircuitBreakerConfig {
                failure_threshold: self.payment_breaker_threshold.max(1),
                ..CircuitBreakerConfig::default()
            },
        }
    }
}
