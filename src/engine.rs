use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::db::Db;
use crate::domain::booking::BookingService;
use crate::domain::cart::CartService;
use crate::domain::inventory::{AvailabilityCalculator, InventoryService, OverlapPolicy};
use crate::domain::order::OrderService;
use crate::health::{ComponentHealth, HealthReport, HealthStatus};
use crate::metrics::Metrics;
use crate::payment::{PaymentAdapter, PaymentGateway};
use crate::utils::{CircuitBreakerConfig, CircuitState, RetryConfig};

// ============================================================================
// Engine - Service wiring
// ============================================================================

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub overlap_policy: OverlapPolicy,
    pub payment_timeout: Duration,
    pub payment_retry: RetryConfig,
    pub payment_breaker: CircuitBreakerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overlap_policy: OverlapPolicy::default(),
            payment_timeout: Duration::from_secs(5),
            payment_retry: RetryConfig::default(),
            payment_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Every service, sharing one database, clock and metrics registry.
#[derive(Clone)]
pub struct Engine {
    pub db: Db,
    pub metrics: Arc<Metrics>,
    pub inventory: InventoryService,
    pub carts: CartService,
    pub orders: Arc<OrderService>,
    pub bookings: Arc<BookingService>,
    gateway: PaymentGateway,
}

impl Engine {
    pub fn new(
        db: Db,
        config: &EngineConfig,
        adapter: Arc<dyn PaymentAdapter>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let calculator = AvailabilityCalculator::new(config.overlap_policy);
        let gateway = PaymentGateway::new(
            adapter,
            config.payment_timeout,
            config.payment_retry.clone(),
            config.payment_breaker.clone(),
            metrics.clone(),
        );

        let inventory = InventoryService::new(db.clone(), calculator, metrics.clone());
        let carts = CartService::new(db.clone(), calculator, clock.clone(), metrics.clone());
        let orders = OrderService::new(db.clone(), calculator, gateway.clone(), clock.clone(), metrics.clone());
        let bookings = BookingService::new(db.clone(), gateway.clone(), clock, metrics.clone());

        tracing::info!(overlap_policy = ?config.overlap_policy, "Engine assembled");

        Self {
            db,
            metrics,
            inventory,
            carts,
            orders: Arc::new(orders),
            bookings: Arc::new(bookings),
            gateway,
        }
    }

    pub async fn health(&self) -> HealthReport {
        let storage = match self.db.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(err) => HealthStatus::Unhealthy(err.to_string()),
        };

        let payments = match self.gateway.circuit_state().await {
            CircuitState::Closed => HealthStatus::Healthy,
            CircuitState::HalfOpen => HealthStatus::Degraded("payment circuit half-open".to_string()),
            CircuitState::Open => HealthStatus::Degraded("payment circuit open".to_string()),
        };

        HealthReport::from_components(vec![
            ComponentHealth::new("storage", storage),
            ComponentHealth::new("payments", payments),
        ])
    }
}
