use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{BookingStatus, TimeSlot};
use crate::actor::Role;
use crate::journal::DomainEvent;
use crate::payment::PaymentDetails;

// ============================================================================
// Booking Domain Events
// ============================================================================

/// Union type for all booking events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum BookingEvent {
    Requested(BookingRequested),
    LocationUpdated(BookingLocationUpdated),
    StatusChanged(BookingStatusChanged),
    PaymentCaptured(BookingPaymentCaptured),
    PaymentDeclined(BookingPaymentDeclined),
}

impl DomainEvent for BookingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::Requested(_) => "BookingRequested",
            BookingEvent::LocationUpdated(_) => "BookingLocationUpdated",
            BookingEvent::StatusChanged(_) => "BookingStatusChanged",
            BookingEvent::PaymentCaptured(_) => "BookingPaymentCaptured",
            BookingEvent::PaymentDeclined(_) => "BookingPaymentDeclined",
        }
    }
}

// Individual event types

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequested {
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub shooting_date: NaiveDate,
    pub shooting_time: TimeSlot,
    pub location: String,
    pub price: i64,
}

/// Same user re-booked a slot they already hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingLocationUpdated {
    pub old_location: String,
    pub new_location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingStatusChanged {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub changed_by: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingPaymentCaptured {
    pub payment: PaymentDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingPaymentDeclined {
    pub reason: String,
}
