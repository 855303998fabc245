use std::sync::Arc;

use uuid::Uuid;

use super::aggregate::StockReleaseHook;
use super::events::{OrderEvent, OrderPlaced};
use super::repository;
use super::value_objects::{Order, OrderLine, OrderStatus};
use crate::actor::Actor;
use crate::clock::Clock;
use crate::db::Db;
use crate::domain::cart;
use crate::domain::inventory::{self, AvailabilityCalculator, Reservation, ReservationStatus};
use crate::error::{EngineError, EngineResult};
use crate::journal::{self, EventEnvelope};
use crate::lifecycle::{Authority, Lifecycle, LifecycleRecord};
use crate::metrics::Metrics;
use crate::payment::{PaymentGateway, PaymentMethod};

// ============================================================================
// Order Service
// ============================================================================
//
// Orchestrates: Cart → Reservations → Order → Journal
//
// Checkout runs as one serialized write transaction; state changes after
// that go through the shared lifecycle handler with the stock release hook.
//
// ============================================================================

pub struct OrderService {
    db: Db,
    lifecycle: Lifecycle<Order, StockReleaseHook>,
    calculator: AvailabilityCalculator,
    gateway: PaymentGateway,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
}

impl OrderService {
    pub fn new(
        db: Db,
        calculator: AvailabilityCalculator,
        gateway: PaymentGateway,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let lifecycle = Lifecycle::new(
            db.clone(),
            StockReleaseHook::new(metrics.clone()),
            clock.clone(),
            metrics.clone(),
        );

        Self {
            db,
            lifecycle,
            calculator,
            gateway,
            clock,
            metrics,
        }
    }

    /// Convert the user's cart into a `Pending` order.
    ///
    /// Every line is re-checked against availability, counting reservations
    /// created for earlier lines of the same cart. The first line that no
    /// longer fits aborts the whole checkout and nothing is written.
    pub async fn create_order(&self, user_id: Uuid) -> EngineResult<Order> {
        let correlation_id = Uuid::now_v7();
        let now = self.clock.now();

        let mut tx = self.db.begin_write().await?;
        let items = cart::repository::list_items(tx.conn(), user_id).await?;
        if items.is_empty() {
            return Err(EngineError::EmptyCart);
        }

        let order_id = Uuid::now_v7();
        let mut lines = Vec::with_capacity(items.len());
        let mut reservation_ids = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let variant = inventory::repository::fetch_variant(tx.conn(), item.variant_id)
                .await?
                .ok_or_else(|| EngineError::not_found("variant", item.variant_id))?;

            let available = self.calculator.available_in(tx.conn(), &variant, &item.range).await?;
            if available < item.quantity {
                self.metrics.record_stock_conflict("checkout");
                tracing::warn!(
                    user_id = %user_id,
                    item_index = index,
                    variant_id = %variant.id,
                    range = %item.range,
                    requested = item.quantity,
                    available,
                    "Checkout lost the race for stock"
                );
                return Err(EngineError::InsufficientStock {
                    item_index: index,
                    variant_id: variant.id,
                    start_date: item.range.start,
                    end_date: item.range.end,
                    requested: item.quantity,
                    available,
                });
            }

            let reservation = Reservation {
                id: Uuid::now_v7(),
                variant_id: variant.id,
                order_id,
                quantity: item.quantity,
                range: item.range,
                status: ReservationStatus::Active,
                created_at: now,
            };
            inventory::repository::insert_reservation(tx.conn(), &reservation).await?;

            reservation_ids.push(reservation.id);
            lines.push(OrderLine::snapshot(&variant, item)?);
        }

        cart::repository::clear(tx.conn(), user_id).await?;

        let total = inventory::sum_amounts(lines.iter().map(|line| line.line_total))?;
        let order = Order {
            id: order_id,
            user_id,
            total,
            lines,
            status: OrderStatus::Pending,
            payment: None,
            created_at: now,
            updated_at: now,
        };
        repository::insert_order(tx.conn(), &order).await?;

        journal::append(
            tx.conn(),
            Order::AGGREGATE,
            order.id,
            OrderEvent::Placed(OrderPlaced {
                user_id,
                lines: order.lines.clone(),
                total: order.total,
                reservation_ids: reservation_ids.clone(),
            }),
            correlation_id,
            Some(user_id),
            now,
        )
        .await?;
        tx.commit().await?;

        self.metrics.orders_created.inc();
        self.metrics.reservations_created.inc_by(reservation_ids.len() as u64);
        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            lines = order.lines.len(),
            total = order.total,
            correlation_id = %correlation_id,
            "✅ Order placed"
        );

        Ok(order)
    }

    pub async fn cancel(&self, order_id: Uuid, actor: &Actor) -> EngineResult<Order> {
        self.lifecycle.cancel(order_id, actor).await
    }

    /// Failure leaves the order and its reservations in place.
    pub async fn process_payment(&self, order_id: Uuid, method: PaymentMethod, actor: &Actor) -> EngineResult<Order> {
        self.lifecycle
            .process_payment(order_id, method, actor, &self.gateway)
            .await
    }

    pub async fn update_status(&self, order_id: Uuid, status: OrderStatus, actor: &Actor) -> EngineResult<Order> {
        actor.ensure_admin("updateStatus")?;
        self.lifecycle
            .transition(order_id, status, actor, Authority::AdminOnly)
            .await
    }

    pub async fn get_order(&self, order_id: Uuid, actor: &Actor) -> EngineResult<Order> {
        let order = self.lifecycle.get(order_id).await?;
        actor.ensure_owner_or_admin(order.user_id, "order")?;
        Ok(order)
    }

    pub async fn list_orders(&self, user_id: Uuid) -> EngineResult<Vec<Order>> {
        let mut conn = self.db.pool().acquire().await?;
        repository::list_for_user(&mut conn, user_id).await
    }

    pub async fn history(&self, order_id: Uuid, actor: &Actor) -> EngineResult<Vec<EventEnvelope<OrderEvent>>> {
        self.get_order(order_id, actor).await?;
        self.lifecycle.history(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::AddCartItem;
    use crate::domain::inventory::Variant;
    use crate::journal::DomainEvent;
    use crate::lifecycle::LifecycleStatus;
    use crate::payment::SandboxPaymentAdapter;
    use crate::domain::inventory::OverlapPolicy;
    use crate::test_support::{day, harness, harness_with, harness_with_policy, Harness};
    use std::time::Duration;

    async fn add(h: &Harness, user: Uuid, variant: &Variant, quantity: i64, start: i64, end: i64) {
        h.engine
            .carts
            .add_item(
                user,
                AddCartItem {
                    variant_id: variant.id,
                    quantity,
                    start_date: day(start),
                    end_date: day(end),
                },
            )
            .await
            .unwrap();
    }

    async fn available(h: &Harness, variant: &Variant, start: i64, end: i64) -> i64 {
        h.engine
            .inventory
            .get_availability(variant.id, day(start), day(end))
            .await
            .unwrap()
            .available
    }

    #[tokio::test]
    async fn test_create_order_reserves_stock_and_clears_cart() {
        let h = harness().await;
        let variant = h.variant(2, 4_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;

        let order = h.engine.orders.create_order(user).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].days, 3);
        assert_eq!(order.total, 12_000);
        assert!(h.engine.carts.get_cart(user).await.unwrap().is_empty());
        assert_eq!(available(&h, &variant, 2, 4).await, 1);
        assert_eq!(h.engine.metrics.orders_created.get(), 1);

        let reservations = h.engine.inventory.reservations_for_order(order.id).await.unwrap();
        assert_eq!(reservations.len(), 1);
        assert!(reservations[0].is_active());
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_be_ordered() {
        let h = harness().await;

        let result = h.engine.orders.create_order(Uuid::new_v4()).await;

        assert!(matches!(result, Err(EngineError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_second_checkout_for_last_unit_fails_atomically() {
        let h = harness().await;
        let variant = h.variant(1, 1_000).await;
        let spare = h.variant(5, 1_000).await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        add(&h, alice, &variant, 1, 1, 3).await;
        add(&h, bob, &spare, 1, 1, 3).await;
        add(&h, bob, &variant, 1, 2, 4).await;

        h.engine.orders.create_order(alice).await.unwrap();
        let result = h.engine.orders.create_order(bob).await;

        match result {
            Err(err @ EngineError::InsufficientStock { .. }) => {
                assert!(err.is_retryable());
                if let EngineError::InsufficientStock {
                    item_index,
                    variant_id,
                    requested,
                    available,
                    ..
                } = err
                {
                    assert_eq!(item_index, 1);
                    assert_eq!(variant_id, variant.id);
                    assert_eq!(requested, 1);
                    assert_eq!(available, 0);
                }
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        // Nothing from Bob's checkout survived, including the line that fit.
        assert_eq!(h.engine.carts.get_cart(bob).await.unwrap().lines.len(), 2);
        assert_eq!(available(&h, &spare, 1, 3).await, 5);
        assert!(h.engine.orders.list_orders(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_counts_earlier_lines_of_the_same_cart() {
        let h = harness().await;
        let variant = h.variant(1, 1_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;
        add(&h, user, &variant, 1, 3, 5).await;

        let result = h.engine.orders.create_order(user).await;

        assert!(matches!(result, Err(EngineError::InsufficientStock { item_index: 1, .. })));
        assert_eq!(available(&h, &variant, 1, 1).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let h = harness().await;
        let variant = h.variant(1, 1_000).await;
        let users: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
        for user in &users {
            add(&h, *user, &variant, 1, 1, 3).await;
        }

        let mut handles = Vec::new();
        for user in users {
            let engine = h.engine.clone();
            handles.push(tokio::spawn(async move { engine.orders.create_order(user).await }));
        }

        let mut placed = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(EngineError::InsufficientStock { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(placed, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(available(&h, &variant, 1, 3).await, 0);
    }

    #[tokio::test]
    async fn test_cancel_releases_stock_and_is_not_repeatable() {
        let h = harness().await;
        let variant = h.variant(1, 1_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;
        let order = h.engine.orders.create_order(user).await.unwrap();
        assert_eq!(available(&h, &variant, 1, 3).await, 0);

        let cancelled = h.engine.orders.cancel(order.id, &Actor::customer(user)).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(available(&h, &variant, 1, 3).await, 1);

        let again = h.engine.orders.cancel(order.id, &Actor::customer(user)).await;
        assert!(matches!(again, Err(EngineError::InvalidTransition { .. })));
        assert_eq!(available(&h, &variant, 1, 3).await, 1);

        let history = h.engine.orders.history(order.id, &Actor::customer(user)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].event_data.event_type(), "OrderStatusChanged");
    }

    #[tokio::test]
    async fn test_customer_cannot_cancel_someone_elses_order() {
        let h = harness().await;
        let variant = h.variant(1, 1_000).await;
        let owner = Uuid::new_v4();
        add(&h, owner, &variant, 1, 1, 3).await;
        let order = h.engine.orders.create_order(owner).await.unwrap();

        let stranger = h.engine.orders.cancel(order.id, &Actor::customer(Uuid::new_v4())).await;
        assert!(matches!(stranger, Err(EngineError::Unauthorized(_))));

        let by_admin = h.engine.orders.cancel(order.id, &h.admin).await.unwrap();
        assert_eq!(by_admin.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_full_rental_lifecycle_releases_on_return() {
        let h = harness().await;
        let variant = h.variant(1, 1_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;
        let order = h.engine.orders.create_order(user).await.unwrap();
        let orders = &h.engine.orders;

        orders.update_status(order.id, OrderStatus::Confirmed, &h.admin).await.unwrap();
        let paid = orders
            .process_payment(order.id, PaymentMethod::Card, &Actor::customer(user))
            .await
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.payment.as_ref().map(|p| p.amount), Some(3_000));

        orders.update_status(order.id, OrderStatus::Delivered, &h.admin).await.unwrap();
        assert_eq!(available(&h, &variant, 1, 3).await, 0);

        let late_cancel = orders.cancel(order.id, &h.admin).await;
        assert!(matches!(late_cancel, Err(EngineError::InvalidTransition { .. })));

        let returned = orders.update_status(order.id, OrderStatus::Returned, &h.admin).await.unwrap();
        assert!(returned.status.is_terminal());
        assert_eq!(available(&h, &variant, 1, 3).await, 1);
    }

    #[tokio::test]
    async fn test_update_status_is_admin_only_and_follows_edges() {
        let h = harness().await;
        let variant = h.variant(1, 1_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;
        let order = h.engine.orders.create_order(user).await.unwrap();

        let by_customer = h
            .engine
            .orders
            .update_status(order.id, OrderStatus::Confirmed, &Actor::customer(user))
            .await;
        assert!(matches!(by_customer, Err(EngineError::Unauthorized(_))));

        let skip = h
            .engine
            .orders
            .update_status(order.id, OrderStatus::Delivered, &h.admin)
            .await;
        assert!(matches!(skip, Err(EngineError::InvalidTransition { .. })));

        let unchanged = h.engine.orders.get_order(order.id, &h.admin).await.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_declined_payment_keeps_order_and_reservations() {
        let h = harness_with(SandboxPaymentAdapter::declining("card expired")).await;
        let variant = h.variant(1, 1_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;
        let order = h.engine.orders.create_order(user).await.unwrap();

        let result = h
            .engine
            .orders
            .process_payment(order.id, PaymentMethod::Card, &Actor::customer(user))
            .await;

        assert!(matches!(result, Err(EngineError::PaymentFailed(_))));
        let after = h.engine.orders.get_order(order.id, &Actor::customer(user)).await.unwrap();
        assert_eq!(after.status, OrderStatus::Pending);
        assert!(after.payment.is_none());
        assert_eq!(available(&h, &variant, 1, 3).await, 0);

        let history = h.engine.orders.history(order.id, &h.admin).await.unwrap();
        assert_eq!(history.last().unwrap().event_type, "OrderPaymentDeclined");
    }

    #[tokio::test]
    async fn test_timed_out_payment_leaves_order_pending() {
        // harness timeout is one second
        let h = harness_with(SandboxPaymentAdapter::approving().with_latency(Duration::from_millis(1_500))).await;
        let variant = h.variant(1, 1_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;
        let order = h.engine.orders.create_order(user).await.unwrap();

        let result = h
            .engine
            .orders
            .process_payment(order.id, PaymentMethod::Card, &Actor::customer(user))
            .await;

        assert!(matches!(result, Err(EngineError::PaymentFailed(_))));
        assert_eq!(h.adapter.attempts(), 1);
        let after = h.engine.orders.get_order(order.id, &h.admin).await.unwrap();
        assert_eq!(after.status, OrderStatus::Pending);
        assert!(after.payment.is_none());
        assert_eq!(available(&h, &variant, 1, 3).await, 0);

        let history = h.engine.orders.history(order.id, &h.admin).await.unwrap();
        assert_eq!(history.last().unwrap().event_type, "OrderPaymentDeclined");
    }

    #[tokio::test]
    async fn test_payment_rejected_outside_payable_states() {
        let h = harness().await;
        let variant = h.variant(1, 1_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;
        let order = h.engine.orders.create_order(user).await.unwrap();
        h.engine.orders.cancel(order.id, &Actor::customer(user)).await.unwrap();

        let result = h
            .engine
            .orders
            .process_payment(order.id, PaymentMethod::EWallet, &Actor::customer(user))
            .await;

        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));
        assert_eq!(h.adapter.attempts(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_payment_wins() {
        let h = harness_with(SandboxPaymentAdapter::approving().with_latency(Duration::from_millis(100))).await;
        let variant = h.variant(1, 1_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;
        let order = h.engine.orders.create_order(user).await.unwrap();

        let engine = h.engine.clone();
        let order_id = order.id;
        let payer = Actor::customer(user);
        let payment = tokio::spawn(async move {
            engine.orders.process_payment(order_id, PaymentMethod::Card, &payer).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.engine.orders.cancel(order.id, &Actor::customer(user)).await.unwrap();

        let result = payment.await.unwrap();
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));

        let after = h.engine.orders.get_order(order.id, &h.admin).await.unwrap();
        assert_eq!(after.status, OrderStatus::Cancelled);
        assert!(after.payment.is_none());
    }

    #[tokio::test]
    async fn test_order_survives_storage_round_trip() {
        let h = harness().await;
        let variant = h.variant(2, 2_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 2, 1, 2).await;
        let placed = h.engine.orders.create_order(user).await.unwrap();

        let loaded = h.engine.orders.get_order(placed.id, &Actor::customer(user)).await.unwrap();
        let listed = h.engine.orders.list_orders(user).await.unwrap();

        assert_eq!(loaded, placed);
        assert_eq!(listed, vec![placed]);
    }

    #[tokio::test]
    async fn test_cart_does_not_hold_stock_but_checkout_does() {
        let h = harness().await;
        let variant = h.variant(2, 5_000).await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        add(&h, alice, &variant, 2, 0, 2).await;
        assert_eq!(available(&h, &variant, 0, 2).await, 2);
        add(&h, bob, &variant, 1, 1, 3).await;

        h.engine.orders.create_order(alice).await.unwrap();
        let result = h.engine.orders.create_order(bob).await;

        assert!(matches!(
            result,
            Err(EngineError::InsufficientStock { item_index: 0, requested: 1, available: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_declined_payment_then_cancel_restores_stock() {
        let h = harness_with(SandboxPaymentAdapter::declining("insufficient funds")).await;
        let variant = h.variant(1, 1_000).await;
        let user = Uuid::new_v4();
        add(&h, user, &variant, 1, 1, 3).await;
        let order = h.engine.orders.create_order(user).await.unwrap();
        let customer = Actor::customer(user);

        let payment = h.engine.orders.process_payment(order.id, PaymentMethod::Card, &customer).await;
        assert!(matches!(payment, Err(EngineError::PaymentFailed(_))));

        let cancelled = h.engine.orders.cancel(order.id, &customer).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(available(&h, &variant, 1, 3).await, 1);
    }

    #[tokio::test]
    async fn test_create_then_cancel_restores_every_line() {
        let h = harness().await;
        let gown = h.variant(3, 2_000).await;
        let veil = h.variant(2, 500).await;
        let user = Uuid::new_v4();
        add(&h, user, &gown, 2, 1, 3).await;
        add(&h, user, &veil, 1, 2, 4).await;
        add(&h, user, &gown, 1, 6, 7).await;

        let before = [
            available(&h, &gown, 1, 3).await,
            available(&h, &veil, 2, 4).await,
            available(&h, &gown, 6, 7).await,
        ];
        let order = h.engine.orders.create_order(user).await.unwrap();
        assert_eq!(order.lines.len(), 3);
        assert_eq!(available(&h, &gown, 1, 3).await, 1);

        h.engine.orders.cancel(order.id, &Actor::customer(user)).await.unwrap();

        let after = [
            available(&h, &gown, 1, 3).await,
            available(&h, &veil, 2, 4).await,
            available(&h, &gown, 6, 7).await,
        ];
        assert_eq!(before, after);
        let reservations = h.engine.inventory.reservations_for_order(order.id).await.unwrap();
        assert!(reservations.iter().all(|r| !r.is_active()));
    }

    #[tokio::test]
    async fn test_same_day_turnaround_allows_back_to_back_rentals() {
        let h = harness_with_policy(SandboxPaymentAdapter::approving(), OverlapPolicy::SameDayTurnaround).await;
        let variant = h.variant(1, 1_000).await;
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        add(&h, first, &variant, 1, 1, 3).await;
        add(&h, second, &variant, 1, 3, 5).await;

        h.engine.orders.create_order(first).await.unwrap();
        let handover = h.engine.orders.create_order(second).await;

        assert!(handover.is_ok());
        assert_eq!(available(&h, &variant, 2, 2).await, 0);
    }
}
