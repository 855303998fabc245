use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::events::*;
use super::repository;
use super::value_objects::{Order, OrderStatus};
use crate::actor::Actor;
use crate::domain::inventory;
use crate::error::EngineResult;
use crate::lifecycle::{LifecycleRecord, ResourceHook};
use crate::metrics::Metrics;
use crate::payment::PaymentDetails;

// ============================================================================
// Order Aggregate - Lifecycle binding
// ============================================================================

#[async_trait]
impl LifecycleRecord for Order {
    type Status = OrderStatus;
    type Event = OrderEvent;

    const AGGREGATE: &'static str = "order";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn amount_due(&self) -> i64 {
        self.total
    }

    fn apply_status(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    fn is_paid(&self) -> bool {
        self.payment.is_some()
    }

    fn apply_payment(&mut self, details: PaymentDetails, at: DateTime<Utc>) {
        self.payment = Some(details);
        self.updated_at = at;
    }

    fn status_after_payment(_from: OrderStatus) -> OrderStatus {
        OrderStatus::Paid
    }

    fn status_changed_event(from: OrderStatus, to: OrderStatus, actor: &Actor) -> OrderEvent {
        OrderEvent::StatusChanged(OrderStatusChanged {
            from,
            to,
            changed_by: actor.user_id,
            role: actor.role,
        })
    }

    fn payment_captured_event(details: &PaymentDetails) -> OrderEvent {
        OrderEvent::PaymentCaptured(OrderPaymentCaptured {
            payment: details.clone(),
        })
    }

    fn payment_declined_event(reason: &str) -> OrderEvent {
        OrderEvent::PaymentDeclined(OrderPaymentDeclined {
            reason: reason.to_string(),
        })
    }

    async fn fetch(conn: &mut SqliteConnection, id: Uuid) -> EngineResult<Option<Self>> {
        repository::fetch_order(conn, id).await
    }

    async fn persist(&self, conn: &mut SqliteConnection) -> EngineResult<()> {
        repository::update_order(conn, self).await
    }
}

/// Gives an order's reserved stock back when it is cancelled or returned.
pub struct StockReleaseHook {
    metrics: Arc<Metrics>,
}

impl StockReleaseHook {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl ResourceHook<Order> for StockReleaseHook {
    async fn on_transition(
        &self,
        conn: &mut SqliteConnection,
        order: &Order,
        _from: OrderStatus,
        to: OrderStatus,
    ) -> EngineResult<()> {
        if !to.releases_stock() {
            return Ok(());
        }

        let released = inventory::repository::release_for_order(conn, order.id).await?;
        self.metrics.reservations_released.inc_by(released);

        tracing::debug!(order_id = %order.id, to = %to, released, "Released reservations");
        Ok(())
    }
}
