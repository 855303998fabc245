// ============================================================================
// Payment - External authorization capability
// ============================================================================
//
// The engine never talks to a real provider. A `PaymentAdapter` answers
// pass or fail; `PaymentGateway` wraps one with a bounded timeout, retries
// for transient unavailability and a circuit breaker.
//
// ============================================================================

mod gateway;
mod sandbox;

pub use gateway::PaymentGateway;
pub use sandbox::SandboxPaymentAdapter;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::IsTransient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    EWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::EWallet => "e_wallet",
        }
    }
}

/// What is being paid for.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub subject_id: Uuid,
    pub subject_kind: &'static str,
    pub payer_id: Uuid,
    pub amount: i64,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub transaction_ref: String,
}

/// Payment details recorded on an order or booking after authorization.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub transaction_ref: String,
    pub amount: i64,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),

    #[error("payment provider unavailable: {0}")]
    Unavailable(String),

    #[error("payment provider timed out after {0:?}")]
    TimedOut(Duration),

    #[error("payment provider circuit is open")]
    CircuitOpen,
}

impl PaymentError {
    pub fn outcome(&self) -> &'static str {
        match self {
            PaymentError::Declined(_) => "declined",
            PaymentError::Unavailable(_) => "unavailable",
            PaymentError::TimedOut(_) => "timed_out",
            PaymentError::CircuitOpen => "circuit_open",
        }
    }
}

impl IsTransient for PaymentError {
    // A timed-out authorization may still have gone through, so only a
    // provider that refused the connection outright is retried.
    fn is_transient(&self) -> bool {
        matches!(self, PaymentError::Unavailable(_))
    }
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError>;
}
