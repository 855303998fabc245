use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cart::CartItem;
use crate::domain::inventory::Variant;
use crate::error::{EngineResult, UnknownStatus};
use crate::lifecycle::LifecycleStatus;
use crate::payment::PaymentDetails;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Immutable snapshot of one cart line taken at checkout.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OrderLine {
    pub variant_id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    pub daily_rate: i64,
    pub quantity: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub line_total: i64,
}

impl OrderLine {
    pub fn snapshot(variant: &Variant, item: &CartItem) -> EngineResult<Self> {
        Ok(Self {
            variant_id: variant.id,
            product_id: variant.product_id,
            size: variant.size.clone(),
            color: variant.color.clone(),
            daily_rate: variant.daily_rate,
            quantity: item.quantity,
            start_date: item.range.start,
            end_date: item.range.end,
            days: item.range.days(),
            line_total: variant.rental_price(&item.range, item.quantity)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Paid,
    Delivered,
    Returned,
    Cancelled,
}

impl LifecycleStatus for OrderStatus {
    const EDGES: &'static [(Self, Self)] = &[
        (OrderStatus::Pending, OrderStatus::Confirmed),
        (OrderStatus::Confirmed, OrderStatus::Paid),
        (OrderStatus::Paid, OrderStatus::Delivered),
        (OrderStatus::Delivered, OrderStatus::Returned),
    ];
    const CANCELLED: Self = OrderStatus::Cancelled;
    const CANCELLABLE: &'static [Self] = &[OrderStatus::Pending, OrderStatus::Confirmed, OrderStatus::Paid];
    const TERMINAL: &'static [Self] = &[OrderStatus::Returned, OrderStatus::Cancelled];
    const PAYABLE: &'static [Self] = &[OrderStatus::Pending, OrderStatus::Confirmed];

    fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Paid => "paid",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Returned => "returned",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl OrderStatus {
    /// Entering these statuses gives the order's stock back.
    pub fn releases_stock(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "paid" => Ok(OrderStatus::Paid),
            "delivered" => Ok(OrderStatus::Delivered),
            "returned" => Ok(OrderStatus::Returned),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus {
                kind: "order",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub total: i64,
    pub status: OrderStatus,
    pub payment: Option<PaymentDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Paid,
        OrderStatus::Delivered,
        OrderStatus::Returned,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_allowed_edges() {
        use OrderStatus::*;
        let allowed = [
            (Pending, Confirmed),
            (Confirmed, Paid),
            (Paid, Delivered),
            (Delivered, Returned),
            (Pending, Cancelled),
            (Confirmed, Cancelled),
            (Paid, Cancelled),
        ];

        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for from in [OrderStatus::Returned, OrderStatus::Cancelled] {
            assert!(from.is_terminal());
            assert!(ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_delivered_order_cannot_be_cancelled() {
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn test_payable_statuses() {
        assert!(OrderStatus::Pending.is_payable());
        assert!(OrderStatus::Confirmed.is_payable());
        assert!(!OrderStatus::Paid.is_payable());
    }

    #[test]
    fn test_status_parses_from_storage_form() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
