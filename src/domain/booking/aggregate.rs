use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::events::*;
use super::repository;
use super::value_objects::{Booking, BookingStatus};
use crate::actor::Actor;
use crate::error::{EngineError, EngineResult};
use crate::lifecycle::{LifecycleRecord, ResourceHook};
use crate::metrics::Metrics;
use crate::payment::PaymentDetails;

// ============================================================================
// Booking Aggregate - Lifecycle binding
// ============================================================================

#[async_trait]
impl LifecycleRecord for Booking {
    type Status = BookingStatus;
    type Event = BookingEvent;

    const AGGREGATE: &'static str = "booking";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }

    fn status(&self) -> BookingStatus {
        self.status
    }

    fn amount_due(&self) -> i64 {
        self.price
    }

    fn apply_status(&mut self, status: BookingStatus, at: DateTime<Utc>) {
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

    /// Paying confirms a pending booking; a confirmed one stays confirmed.
    fn status_after_payment(from: BookingStatus) -> BookingStatus {
        match from {
            BookingStatus::Pending => BookingStatus::Confirmed,
            other => other,
        }
    }

    fn status_changed_event(from: BookingStatus, to: BookingStatus, actor: &Actor) -> BookingEvent {
        BookingEvent::StatusChanged(BookingStatusChanged {
            from,
            to,
            changed_by: actor.user_id,
            role: actor.role,
        })
    }

    fn payment_captured_event(details: &PaymentDetails) -> BookingEvent {
        BookingEvent::PaymentCaptured(BookingPaymentCaptured {
            payment: details.clone(),
        })
    }

    fn payment_declined_event(reason: &str) -> BookingEvent {
        BookingEvent::PaymentDeclined(BookingPaymentDeclined {
            reason: reason.to_string(),
        })
    }

    async fn fetch(conn: &mut SqliteConnection, id: Uuid) -> EngineResult<Option<Self>> {
        repository::fetch_booking(conn, id).await
    }

    async fn persist(&self, conn: &mut SqliteConnection) -> EngineResult<()> {
        repository::update_booking(conn, self).await
    }
}

/// Refuses to confirm a booking while another booking holds its slot.
pub struct SlotExclusivityHook {
    metrics: Arc<Metrics>,
}

impl SlotExclusivityHook {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl ResourceHook<Booking> for SlotExclusivityHook {
    async fn on_transition(
        &self,
        conn: &mut SqliteConnection,
        booking: &Booking,
        _from: BookingStatus,
        to: BookingStatus,
    ) -> EngineResult<()> {
        if to != BookingStatus::Confirmed {
            return Ok(());
        }

        let holders =
            repository::active_at_slot(conn, booking.service_id, booking.shooting_date, &booking.shooting_time)
                .await?;
        if holders.iter().any(|other| other.id != booking.id) {
            self.metrics.slot_conflicts.inc();
            tracing::warn!(
                booking_id = %booking.id,
                service_id = %booking.service_id,
                date = %booking.shooting_date,
                time = %booking.shooting_time,
                "Slot held by another booking"
            );
            return Err(EngineError::SlotConflict {
                service_id: booking.service_id,
                date: booking.shooting_date,
                time: booking.shooting_time.to_string(),
            });
        }

        Ok(())
    }
}
