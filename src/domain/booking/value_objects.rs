use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult, UnknownStatus};
use crate::lifecycle::LifecycleStatus;
use crate::payment::PaymentDetails;

// ============================================================================
// Booking Value Objects
// ============================================================================

/// A bookable photography package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoService {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub price: i64,
}

impl ServiceSpec {
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidRange("service name is required".to_string()));
        }
        if self.price < 0 {
            return Err(EngineError::InvalidRange(format!("price must be >= 0, got {}", self.price)));
        }
        Ok(())
    }
}

/// Shooting time slot in 24h `HH:MM` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(String);

impl TimeSlot {
    pub fn parse(value: &str) -> EngineResult<Self> {
        let value = value.trim();
        let well_formed = value.len() == 5
            && value.as_bytes()[2] == b':'
            && NaiveTime::parse_from_str(value, "%H:%M").is_ok();
        if !well_formed {
            return Err(EngineError::InvalidRange(format!(
                "shooting time must be HH:MM, got {:?}",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl LifecycleStatus for BookingStatus {
    const EDGES: &'static [(Self, Self)] = &[
        (BookingStatus::Pending, BookingStatus::Confirmed),
        (BookingStatus::Confirmed, BookingStatus::Completed),
    ];
    const CANCELLED: Self = BookingStatus::Cancelled;
    const CANCELLABLE: &'static [Self] = &[BookingStatus::Pending, BookingStatus::Confirmed];
    const TERMINAL: &'static [Self] = &[BookingStatus::Completed, BookingStatus::Cancelled];
    const PAYABLE: &'static [Self] = &[BookingStatus::Pending, BookingStatus::Confirmed];

    fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl BookingStatus {
    /// Statuses that hold the slot.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus {
                kind: "booking",
                value: other.to_string(),
            }),
        }
    }
}

/// Request body for a new booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub service_id: Uuid,
    pub shooting_date: NaiveDate,
    pub shooting_time: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub shooting_date: NaiveDate,
    pub shooting_time: TimeSlot,
    pub location: String,
    /// Service price when the booking was made.
    pub price: i64,
    pub status: BookingStatus,
    pub payment: Option<PaymentDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_slot_format() {
        assert_eq!(TimeSlot::parse("09:30").unwrap().as_str(), "09:30");
        assert_eq!(TimeSlot::parse(" 17:00 ").unwrap().as_str(), "17:00");
        for bad in ["9:30", "24:00", "12:60", "noon", "12-30", ""] {
            assert!(TimeSlot::parse(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_time_slot_deserialization_validates() {
        let ok: TimeSlot = serde_json::from_str("\"10:15\"").unwrap();
        assert_eq!(ok.as_str(), "10:15");
        assert!(serde_json::from_str::<TimeSlot>("\"10h15\"").is_err());
    }

    #[test]
    fn test_booking_edges() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(Completed.is_terminal() && Cancelled.is_terminal());
    }

    #[test]
    fn test_service_spec_validation() {
        let spec = ServiceSpec {
            name: " ".to_string(),
            price: 100,
        };
        assert!(spec.validate().is_err());
    }
}
