use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::actor::Actor;
use crate::clock::FixedClock;
use crate::db::Db;
use crate::domain::booking::{PhotoService, ServiceSpec};
use crate::domain::inventory::{OverlapPolicy, Variant, VariantSpec};
use crate::engine::{Engine, EngineConfig};
use crate::metrics::Metrics;
use crate::payment::SandboxPaymentAdapter;
use crate::utils::{CircuitBreakerConfig, RetryConfig};

/// "Today" for every test engine.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Date `offset` days from `today()`.
pub fn day(offset: i64) -> NaiveDate {
    if offset >= 0 {
        today().checked_add_days(Days::new(offset as u64)).unwrap()
    } else {
        today().checked_sub_days(Days::new(offset.unsigned_abs())).unwrap()
    }
}

pub struct Harness {
    pub engine: Engine,
    pub adapter: Arc<SandboxPaymentAdapter>,
    pub admin: Actor,
}

impl Harness {
    pub async fn variant(&self, stock: i64, daily_rate: i64) -> Variant {
        self.engine
            .inventory
            .upsert_variant(
                &self.admin,
                Uuid::now_v7(),
                VariantSpec {
                    product_id: Uuid::new_v4(),
                    size: "M".to_string(),
                    color: "ivory".to_string(),
                    stock,
                    daily_rate,
                },
            )
            .await
            .unwrap()
    }

    pub async fn photo_service(&self, price: i64) -> PhotoService {
        self.engine
            .bookings
            .upsert_service(
                &self.admin,
                Uuid::now_v7(),
                ServiceSpec {
                    name: "Pre-wedding shoot".to_string(),
                    price,
                },
            )
            .await
            .unwrap()
    }
}

pub async fn harness() -> Harness {
    harness_with(SandboxPaymentAdapter::approving()).await
}

pub async fn harness_with(adapter: SandboxPaymentAdapter) -> Harness {
    harness_with_policy(adapter, OverlapPolicy::Inclusive).await
}

pub async fn harness_with_policy(adapter: SandboxPaymentAdapter, policy: OverlapPolicy) -> Harness {
    let db = Db::in_memory().await.unwrap();
    let adapter = Arc::new(adapter);
    let config = EngineConfig {
        overlap_policy: policy,
        payment_timeout: Duration::from_secs(1),
        payment_retry: RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        },
        payment_breaker: CircuitBreakerConfig::default(),
    };
    let engine = Engine::new(
        db,
        &config,
        adapter.clone(),
        Arc::new(FixedClock::on(today())),
        Arc::new(Metrics::new().unwrap()),
    );

    Harness {
        engine,
        adapter,
        admin: Actor::admin(Uuid::new_v4()),
    }
}
