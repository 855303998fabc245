use chrono::NaiveDate;
use sqlx::SqliteConnection;

use super::repository;
use super::value_objects::{DateRange, OverlapPolicy, Reservation, Variant};
use crate::error::EngineResult;

// ============================================================================
// Availability Calculator
// ============================================================================
//
// available = stock − Σ quantity of active reservations overlapping the
// query range, clamped at 0. Pure over its inputs; the async helper only
// loads the reservations first.
//
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityCalculator {
    policy: OverlapPolicy,
}

/// Highest number of units held at once, and the first day it occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakUsage {
    pub units: i64,
    pub on: Option<NaiveDate>,
}

impl AvailabilityCalculator {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    pub fn reserved(&self, reservations: &[Reservation], range: &DateRange) -> i64 {
        reservations
            .iter()
            .filter(|r| r.is_active() && self.policy.overlaps(&r.range, range))
            .map(|r| r.quantity)
            .sum()
    }

    pub fn available(&self, stock: i64, reservations: &[Reservation], range: &DateRange) -> i64 {
        (stock - self.reserved(reservations, range)).max(0)
    }

    /// Sweep over reservation boundaries to find the peak concurrent usage.
    pub fn peak_usage(&self, reservations: &[Reservation]) -> PeakUsage {
        let mut edges: Vec<(NaiveDate, i64)> = Vec::with_capacity(reservations.len() * 2);
        for reservation in reservations.iter().filter(|r| r.is_active()) {
            edges.push((reservation.range.start, reservation.quantity));
            edges.push((self.policy.free_from(&reservation.range), -reservation.quantity));
        }
        // Releases before acquisitions on the same day.
        edges.sort_by_key(|&(day, delta)| (day, delta));

        let mut current = 0;
        let mut peak = PeakUsage { units: 0, on: None };
        for (day, delta) in edges {
            current += delta;
            if current > peak.units {
                peak = PeakUsage {
                    units: current,
                    on: Some(day),
                };
            }
        }
        peak
    }

    /// Availability as seen from inside a transaction, so reservations
    /// written earlier in the same transaction are counted.
    pub async fn available_in(
        &self,
        conn: &mut SqliteConnection,
        variant: &Variant,
        range: &DateRange,
    ) -> EngineResult<i64> {
        let reservations = repository::active_reservations(conn, variant.id).await?;
        Ok(self.available(variant.stock, &reservations, range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::ReservationStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn reservation(start: u32, end: u32, quantity: i64) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            variant_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            quantity,
            range: DateRange::new(d(start), d(end)).unwrap(),
            status: ReservationStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_overlapping_reservation_reduces_availability() {
        let calc = AvailabilityCalculator::default();
        let held = vec![reservation(1, 3, 1)];

        assert_eq!(calc.available(2, &held, &DateRange::new(d(2), d(4)).unwrap()), 1);
        assert_eq!(calc.available(2, &held, &DateRange::new(d(4), d(6)).unwrap()), 2);
    }

    #[test]
    fn test_availability_is_clamped_at_zero() {
        let calc = AvailabilityCalculator::default();
        let held = vec![reservation(1, 3, 2), reservation(2, 4, 2)];

        assert_eq!(calc.available(3, &held, &DateRange::new(d(2), d(2)).unwrap()), 0);
    }

    #[test]
    fn test_released_reservations_are_ignored() {
        let calc = AvailabilityCalculator::default();
        let mut released = reservation(1, 3, 1);
        released.status = ReservationStatus::Released;

        assert_eq!(calc.available(1, &[released], &DateRange::new(d(1), d(3)).unwrap()), 1);
    }

    #[test]
    fn test_boundary_day_depends_on_policy() {
        let held = vec![reservation(1, 3, 1)];
        let query = DateRange::new(d(3), d(5)).unwrap();

        let inclusive = AvailabilityCalculator::new(OverlapPolicy::Inclusive);
        let turnaround = AvailabilityCalculator::new(OverlapPolicy::SameDayTurnaround);

        assert_eq!(inclusive.available(1, &held, &query), 0);
        assert_eq!(turnaround.available(1, &held, &query), 1);
    }

    #[test]
    fn test_peak_usage_finds_busiest_day() {
        let calc = AvailabilityCalculator::default();
        let held = vec![reservation(1, 3, 1), reservation(3, 5, 2), reservation(6, 8, 1)];

        let peak = calc.peak_usage(&held);

        assert_eq!(peak.units, 3);
        assert_eq!(peak.on, Some(d(3)));
    }

    #[test]
    fn test_peak_usage_with_same_day_turnaround() {
        let calc = AvailabilityCalculator::new(OverlapPolicy::SameDayTurnaround);
        let held = vec![reservation(1, 3, 1), reservation(3, 5, 1)];

        assert_eq!(calc.peak_usage(&held).units, 1);
    }

    #[test]
    fn test_peak_usage_of_nothing_is_zero() {
        let calc = AvailabilityCalculator::default();
        assert_eq!(calc.peak_usage(&[]), PeakUsage { units: 0, on: None });
    }
}
