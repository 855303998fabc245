use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult, UnknownStatus};

// ============================================================================
// Inventory Value Objects
// ============================================================================

/// Calendar date range, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Range for availability queries. A single day is allowed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        if start > end {
            return Err(EngineError::InvalidRange(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Range for a rental line: must end strictly after it starts and must
    /// not start in the past.
    pub fn rental(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> EngineResult<Self> {
        if start >= end {
            return Err(EngineError::InvalidRange(format!(
                "end date {} must be after start date {}",
                end, start
            )));
        }
        if start < today {
            return Err(EngineError::InvalidRange(format!(
                "start date {} is in the past",
                start
            )));
        }
        Ok(Self { start, end })
    }

    /// Billable days, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// When two rentals of the same unit collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Ranges sharing any calendar day collide.
    #[default]
    Inclusive,
    /// A return day may be another rental's pickup day.
    SameDayTurnaround,
}

impl OverlapPolicy {
    pub fn overlaps(self, a: &DateRange, b: &DateRange) -> bool {
        match self {
            OverlapPolicy::Inclusive => a.start <= b.end && b.start <= a.end,
            OverlapPolicy::SameDayTurnaround => a.start < b.end && b.start < a.end,
        }
    }

    /// First day on which a unit held for `range` is free again.
    pub fn free_from(self, range: &DateRange) -> NaiveDate {
        match self {
            OverlapPolicy::Inclusive => range
                .end
                .checked_add_days(Days::new(1))
                .unwrap_or(NaiveDate::MAX),
            OverlapPolicy::SameDayTurnaround => range.end,
        }
    }
}

/// Stockable (product, size, color) combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    /// Units on hand. Reservations reduce availability, not this count.
    pub stock: i64,
    /// Minor currency units per rental day.
    pub daily_rate: i64,
}

impl Variant {
    /// Rate × days × quantity. No taxes or discounts.
    pub fn rental_price(&self, range: &DateRange, quantity: i64) -> EngineResult<i64> {
        self.daily_rate
            .checked_mul(range.days())
            .and_then(|amount| amount.checked_mul(quantity))
            .ok_or_else(|| {
                EngineError::InvalidRange(format!(
                    "price of {} x {} for {} does not fit an amount",
                    quantity, self.id, range
                ))
            })
    }
}

/// Sum of line totals, failing instead of wrapping.
pub fn sum_amounts(amounts: impl IntoIterator<Item = i64>) -> EngineResult<i64> {
    amounts
        .into_iter()
        .try_fold(0i64, |total, amount| total.checked_add(amount))
        .ok_or_else(|| EngineError::InvalidRange("total amount is too large".to_string()))
}

/// Admin input for registering or updating a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSpec {
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    pub stock: i64,
    pub daily_rate: i64,
}

impl VariantSpec {
    pub fn validate(&self) -> EngineResult<()> {
        if self.stock < 0 {
            return Err(EngineError::InvalidRange(format!("stock must be >= 0, got {}", self.stock)));
        }
        if self.daily_rate < 0 {
            return Err(EngineError::InvalidRange(format!(
                "daily rate must be >= 0, got {}",
                self.daily_rate
            )));
        }
        if self.size.trim().is_empty() || self.color.trim().is_empty() {
            return Err(EngineError::InvalidRange("size and color are required".to_string()));
        }
        Ok(())
    }

    pub fn into_variant(self, id: Uuid) -> Variant {
        Variant {
            id,
            product_id: self.product_id,
            size: self.size,
            color: self.color,
            stock: self.stock,
            daily_rate: self.daily_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Released,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Released => "released",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ReservationStatus::Active),
            "released" => Ok(ReservationStatus::Released),
            other => Err(UnknownStatus {
                kind: "reservation",
                value: other.to_string(),
            }),
        }
    }
}

/// Units of one variant held by one order for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub order_id: Uuid,
    pub quantity: i64,
    pub range: DateRange,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

/// Answer to an availability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub variant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: i64,
}

// ============================================================================
// Unit Tests
// ============================================================================
