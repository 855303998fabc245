use std::sync::Arc;

use uuid::Uuid;

use super::aggregate::SlotExclusivityHook;
use super::events::{BookingEvent, BookingLocationUpdated, BookingRequested};
use super::repository;
use super::value_objects::{Booking, BookingStatus, NewBooking, PhotoService, ServiceSpec, TimeSlot};
use crate::actor::Actor;
use crate::clock::Clock;
use crate::db::Db;
use crate::error::{EngineError, EngineResult};
use crate::journal::{self, EventEnvelope};
use crate::lifecycle::{Authority, Lifecycle, LifecycleRecord};
use crate::metrics::Metrics;
use crate::payment::{PaymentGateway, PaymentMethod};

// ============================================================================
// Booking Service
// ============================================================================
//
// Orchestrates: Validate → Slot check → Booking → Journal
//
// A slot is (service, date, time). At most one user may hold it in a
// pending or confirmed booking.
//
// ============================================================================

pub struct BookingService {
    db: Db,
    lifecycle: Lifecycle<Booking, SlotExclusivityHook>,
    gateway: PaymentGateway,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
}

impl BookingService {
    pub fn new(db: Db, gateway: PaymentGateway, clock: Arc<dyn Clock>, metrics: Arc<Metrics>) -> Self {
        let lifecycle = Lifecycle::new(
            db.clone(),
            SlotExclusivityHook::new(metrics.clone()),
            clock.clone(),
            metrics.clone(),
        );

        Self {
            db,
            lifecycle,
            gateway,
            clock,
            metrics,
        }
    }

    pub async fn upsert_service(&self, actor: &Actor, service_id: Uuid, spec: ServiceSpec) -> EngineResult<PhotoService> {
        actor.ensure_admin("upsertService")?;
        spec.validate()?;

        let service = PhotoService {
            id: service_id,
            name: spec.name.trim().to_string(),
            price: spec.price,
        };

        let mut tx = self.db.begin_write().await?;
        repository::upsert_service(tx.conn(), &service).await?;
        tx.commit().await?;

        tracing::info!(service_id = %service.id, name = %service.name, price = service.price, "Photo service upserted");
        Ok(service)
    }

    pub async fn get_service(&self, service_id: Uuid) -> EngineResult<PhotoService> {
        let mut conn = self.db.pool().acquire().await?;
        repository::fetch_service(&mut conn, service_id)
            .await?
            .ok_or_else(|| EngineError::not_found("photo service", service_id))
    }

    /// Book a slot, or update the location of the caller's existing booking
    /// for the same slot.
    pub async fn create_booking(&self, user_id: Uuid, request: NewBooking) -> EngineResult<Booking> {
        let location = request.location.trim().to_string();
        if location.is_empty() {
            return Err(EngineError::InvalidRange("location is required".to_string()));
        }
        let time = TimeSlot::parse(&request.shooting_time)?;
        let today = self.clock.today();
        if request.shooting_date < today {
            return Err(EngineError::InvalidRange(format!(
                "shooting date {} is in the past",
                request.shooting_date
            )));
        }

        let correlation_id = Uuid::now_v7();
        let now = self.clock.now();

        let mut tx = self.db.begin_write().await?;
        let service = repository::fetch_service(tx.conn(), request.service_id)
            .await?
            .ok_or_else(|| EngineError::not_found("photo service", request.service_id))?;

        let holders = repository::active_at_slot(tx.conn(), service.id, request.shooting_date, &time).await?;

        if holders.iter().any(|holder| holder.user_id != user_id) {
            self.metrics.slot_conflicts.inc();
            tracing::info!(
                user_id = %user_id,
                service_id = %service.id,
                date = %request.shooting_date,
                time = %time,
                "Slot already taken"
            );
            return Err(EngineError::SlotConflict {
                service_id: service.id,
                date: request.shooting_date,
                time: time.to_string(),
            });
        }

        if let Some(mut existing) = holders.into_iter().next() {
            let old_location = std::mem::replace(&mut existing.location, location);
            existing.updated_at = now;
            repository::update_booking(tx.conn(), &existing).await?;
            journal::append(
                tx.conn(),
                Booking::AGGREGATE,
                existing.id,
                BookingEvent::LocationUpdated(BookingLocationUpdated {
                    old_location,
                    new_location: existing.location.clone(),
                }),
                correlation_id,
                Some(user_id),
                now,
            )
            .await?;
            tx.commit().await?;

            tracing::debug!(booking_id = %existing.id, user_id = %user_id, "Existing booking updated");
            return Ok(existing);
        }

        let booking = Booking {
            id: Uuid::now_v7(),
            user_id,
            service_id: service.id,
            shooting_date: request.shooting_date,
            shooting_time: time,
            location,
            price: service.price,
            status: BookingStatus::Pending,
            payment: None,
            created_at: now,
            updated_at: now,
        };
        repository::insert_booking(tx.conn(), &booking).await?;
        journal::append(
            tx.conn(),
            Booking::AGGREGATE,
            booking.id,
            BookingEvent::Requested(BookingRequested {
                user_id,
                service_id: booking.service_id,
                shooting_date: booking.shooting_date,
                shooting_time: booking.shooting_time.clone(),
                location: booking.location.clone(),
                price: booking.price,
            }),
            correlation_id,
            Some(user_id),
            now,
        )
        .await?;
        tx.commit().await?;

        self.metrics.bookings_created.inc();
        tracing::info!(
            booking_id = %booking.id,
            user_id = %user_id,
            service_id = %booking.service_id,
            date = %booking.shooting_date,
            time = %booking.shooting_time,
            "📸 Booking requested"
        );

        Ok(booking)
    }

    pub async fn cancel(&self, booking_id: Uuid, actor: &Actor) -> EngineResult<Booking> {
        self.lifecycle.cancel(booking_id, actor).await
    }

    pub async fn update_status(&self, booking_id: Uuid, status: BookingStatus, actor: &Actor) -> EngineResult<Booking> {
        actor.ensure_admin("updateStatus")?;
        self.lifecycle
            .transition(booking_id, status, actor, Authority::AdminOnly)
            .await
    }

    pub async fn process_payment(&self, booking_id: Uuid, method: PaymentMethod, actor: &Actor) -> EngineResult<Booking> {
        self.lifecycle
            .process_payment(booking_id, method, actor, &self.gateway)
            .await
    }

    pub async fn get_booking(&self, booking_id: Uuid, actor: &Actor) -> EngineResult<Booking> {
        let booking = self.lifecycle.get(booking_id).await?;
        actor.ensure_owner_or_admin(booking.user_id, "booking")?;
        Ok(booking)
    }

    pub async fn list_bookings(&self, user_id: Uuid) -> EngineResult<Vec<Booking>> {
        let mut conn = self.db.pool().acquire().await?;
        repository::list_for_user(&mut conn, user_id).await
    }

    pub async fn history(&self, booking_id: Uuid, actor: &Actor) -> EngineResult<Vec<EventEnvelope<BookingEvent>>> {
        self.get_booking(booking_id, actor).await?;
        self.lifecycle.history(booking_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::SandboxPaymentAdapter;
    use crate::test_support::{day, harness, harness_with, Harness};

    fn request(service: &PhotoService, date: i64, time: &str, location: &str) -> NewBooking {
        NewBooking {
            service_id: service.id,
            shooting_date: day(date),
            shooting_time: time.to_string(),
            location: location.to_string(),
        }
    }

    async fn book(h: &Harness, user: Uuid, service: &PhotoService, time: &str) -> Booking {
        h.engine
            .bookings
            .create_booking(user, request(service, 5, time, "Botanical garden"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_booking_snapshots_price() {
        let h = harness().await;
        let service = h.photo_service(20_000).await;

        let booking = book(&h, Uuid::new_v4(), &service, "10:00").await;

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.price, 20_000);
        assert_eq!(h.engine.metrics.bookings_created.get(), 1);
    }

    #[tokio::test]
    async fn test_create_booking_validates_input() {
        let h = harness().await;
        let service = h.photo_service(20_000).await;
        let user = Uuid::new_v4();
        let bookings = &h.engine.bookings;

        assert!(matches!(
            bookings.create_booking(user, request(&service, 5, "10:00", "  ")).await,
            Err(EngineError::InvalidRange(_))
        ));
        assert!(matches!(
            bookings.create_booking(user, request(&service, 5, "10am", "Studio")).await,
            Err(EngineError::InvalidRange(_))
        ));
        assert!(matches!(
            bookings.create_booking(user, request(&service, -1, "10:00", "Studio")).await,
            Err(EngineError::InvalidRange(_))
        ));

        let mut unknown = request(&service, 5, "10:00", "Studio");
        unknown.service_id = Uuid::new_v4();
        assert!(matches!(
            bookings.create_booking(user, unknown).await,
            Err(EngineError::NotFound { entity: "photo service", .. })
        ));
    }

    #[tokio::test]
    async fn test_slot_taken_by_another_user_conflicts() {
        let h = harness().await;
        let service = h.photo_service(20_000).await;
        book(&h, Uuid::new_v4(), &service, "10:00").await;

        let result = h
            .engine
            .bookings
            .create_booking(Uuid::new_v4(), request(&service, 5, "10:00", "Beach"))
            .await;

        assert!(matches!(result, Err(EngineError::SlotConflict { .. })));
        assert_eq!(h.engine.metrics.slot_conflicts.get(), 1);

        // A different time on the same day is free.
        let other_time = h
            .engine
            .bookings
            .create_booking(Uuid::new_v4(), request(&service, 5, "14:00", "Beach"))
            .await;
        assert!(other_time.is_ok());
    }

    #[tokio::test]
    async fn test_same_user_rebooking_updates_location() {
        let h = harness().await;
        let service = h.photo_service(20_000).await;
        let user = Uuid::new_v4();
        let first = book(&h, user, &service, "10:00").await;

        let second = h
            .engine
            .bookings
            .create_booking(user, request(&service, 5, "10:00", "Old town"))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.location, "Old town");
        assert_eq!(h.engine.bookings.list_bookings(user).await.unwrap().len(), 1);

        let history = h.engine.bookings.history(first.id, &Actor::customer(user)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].event_type, "BookingLocationUpdated");
    }

    #[tokio::test]
    async fn test_cancelled_slot_can_be_rebooked() {
        let h = harness().await;
        let service = h.photo_service(20_000).await;
        let first_user = Uuid::new_v4();
        let booking = book(&h, first_user, &service, "10:00").await;
        h.engine.bookings.cancel(booking.id, &Actor::customer(first_user)).await.unwrap();

        let rebooked = book(&h, Uuid::new_v4(), &service, "10:00").await;

        assert_ne!(rebooked.id, booking.id);
        assert_eq!(rebooked.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_payment_confirms_pending_booking() {
        let h = harness().await;
        let service = h.photo_service(20_000).await;
        let user = Uuid::new_v4();
        let booking = book(&h, user, &service, "10:00").await;

        let paid = h
            .engine
            .bookings
            .process_payment(booking.id, PaymentMethod::BankTransfer, &Actor::customer(user))
            .await
            .unwrap();

        assert_eq!(paid.status, BookingStatus::Confirmed);
        assert_eq!(paid.payment.as_ref().map(|p| p.amount), Some(20_000));

        let completed = h
            .engine
            .bookings
            .update_status(booking.id, BookingStatus::Completed, &h.admin)
            .await
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);

        let cancel = h.engine.bookings.cancel(booking.id, &Actor::customer(user)).await;
        assert!(matches!(cancel, Err(EngineError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_payment_on_confirmed_booking_only_records_payment() {
        let h = harness().await;
        let service = h.photo_service(12_000).await;
        let user = Uuid::new_v4();
        let booking = book(&h, user, &service, "10:00").await;
        h.engine
            .bookings
            .update_status(booking.id, BookingStatus::Confirmed, &h.admin)
            .await
            .unwrap();

        let paid = h
            .engine
            .bookings
            .process_payment(booking.id, PaymentMethod::Card, &Actor::customer(user))
            .await
            .unwrap();

        assert_eq!(paid.status, BookingStatus::Confirmed);
        assert!(paid.payment.is_some());
    }

    #[tokio::test]
    async fn test_paid_booking_is_not_charged_twice() {
        let h = harness().await;
        let service = h.photo_service(20_000).await;
        let user = Uuid::new_v4();
        let booking = book(&h, user, &service, "10:00").await;
        let customer = Actor::customer(user);

        let paid = h
            .engine
            .bookings
            .process_payment(booking.id, PaymentMethod::Card, &customer)
            .await
            .unwrap();
        let first_ref = paid.payment.as_ref().map(|p| p.transaction_ref.clone());

        let again = h
            .engine
            .bookings
            .process_payment(booking.id, PaymentMethod::Card, &customer)
            .await;

        assert!(matches!(again, Err(EngineError::InvalidTransition { .. })));
        assert_eq!(h.adapter.attempts(), 1);
        let after = h.engine.bookings.get_booking(booking.id, &customer).await.unwrap();
        assert_eq!(after.status, BookingStatus::Confirmed);
        assert_eq!(after.payment.map(|p| p.transaction_ref), first_ref);
    }

    #[tokio::test]
    async fn test_declined_booking_payment_leaves_booking_pending() {
        let h = harness_with(SandboxPaymentAdapter::declining("do not honor")).await;
        let service = h.photo_service(12_000).await;
        let user = Uuid::new_v4();
        let booking = book(&h, user, &service, "10:00").await;

        let result = h
            .engine
            .bookings
            .process_payment(booking.id, PaymentMethod::Card, &Actor::customer(user))
            .await;

        assert!(matches!(result, Err(EngineError::PaymentFailed(_))));
        let after = h.engine.bookings.get_booking(booking.id, &h.admin).await.unwrap();
        assert_eq!(after.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirming_a_double_booked_slot_is_refused() {
        let h = harness().await;
        let service = h.photo_service(12_000).await;
        let first = book(&h, Uuid::new_v4(), &service, "10:00").await;

        // A second holder can only appear through direct storage writes.
        let mut intruder = first.clone();
        intruder.id = Uuid::now_v7();
        intruder.user_id = Uuid::new_v4();
        let mut tx = h.engine.db.begin_write().await.unwrap();
        repository::insert_booking(tx.conn(), &intruder).await.unwrap();
        tx.commit().await.unwrap();

        let result = h
            .engine
            .bookings
            .update_status(first.id, BookingStatus::Confirmed, &h.admin)
            .await;

        assert!(matches!(result, Err(EngineError::SlotConflict { .. })));
        let after = h.engine.bookings.get_booking(first.id, &h.admin).await.unwrap();
        assert_eq!(after.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_strangers_cannot_read_or_cancel_bookings() {
        let h = harness().await;
        let service = h.photo_service(12_000).await;
        let booking = book(&h, Uuid::new_v4(), &service, "10:00").await;
        let stranger = Actor::customer(Uuid::new_v4());

        assert!(matches!(
            h.engine.bookings.get_booking(booking.id, &stranger).await,
            Err(EngineError::Unauthorized(_))
        ));
        assert!(matches!(
            h.engine.bookings.cancel(booking.id, &stranger).await,
            Err(EngineError::Unauthorized(_))
        ));
    }
}
