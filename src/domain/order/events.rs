use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{OrderLine, OrderStatus};
use crate::actor::Role;
use crate::journal::DomainEvent;
use crate::payment::PaymentDetails;

// ============================================================================
// Order Events - Journal entries for the order lifecycle
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    StatusChanged(OrderStatusChanged),
    PaymentCaptured(OrderPaymentCaptured),
    PaymentDeclined(OrderPaymentDeclined),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
            OrderEvent::PaymentCaptured(_) => "OrderPaymentCaptured",
            OrderEvent::PaymentDeclined(_) => "OrderPaymentDeclined",
        }
    }
}

/// Cart converted into an order; reservations created.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderPlaced {
    pub user_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub total: i64,
    pub reservation_ids: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_by: Uuid,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderPaymentCaptured {
    pub payment: PaymentDetails,
}

/// Authorization failed; the order was left as it was.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderPaymentDeclined {
    pub reason: String,
}
