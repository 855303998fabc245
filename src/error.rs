use chrono::NaiveDate;
use uuid::Uuid;

// ============================================================================
// Engine Errors - Per-request failure taxonomy
// ============================================================================
//
// Every variant is a per-request failure returned to the caller. Validation
// failures are raised before any mutation, and write transactions roll back
// on drop, so no variant ever implies a partial write.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Out of stock for variant {variant_id}: requested {requested}, available {available}")]
    OutOfStock {
        variant_id: Uuid,
        requested: i64,
        available: i64,
    },

    #[error(
        "Insufficient stock for cart item {item_index} (variant {variant_id}, {start_date}..={end_date}): \
         requested {requested}, available {available}"
    )]
    InsufficientStock {
        item_index: usize,
        variant_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        requested: i64,
        available: i64,
    },

    #[error("Invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Slot {date} {time} for service {service_id} is already taken")]
    SlotConflict {
        service_id: Uuid,
        date: NaiveDate,
        time: String,
    },

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the caller may reasonably retry after adjusting its request.
    ///
    /// Losing the race between cart validation and checkout is expected and
    /// surfaces as `InsufficientStock`; a declined or timed-out payment can be
    /// retried as well.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientStock { .. } | EngineError::PaymentFailed(_)
        )
    }

    /// Stable machine-readable code used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "not_found",
            EngineError::InvalidRange(_) => "invalid_range",
            EngineError::OutOfStock { .. } => "out_of_stock",
            EngineError::InsufficientStock { .. } => "insufficient_stock",
            EngineError::InvalidTransition { .. } => "invalid_transition",
            EngineError::SlotConflict { .. } => "slot_conflict",
            EngineError::PaymentFailed(_) => "payment_failed",
            EngineError::Unauthorized(_) => "unauthorized",
            EngineError::EmptyCart => "empty_cart",
            EngineError::Storage(_) => "storage",
            EngineError::Serialization(_) => "serialization",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// A stored or submitted status string that names no known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

impl From<UnknownStatus> for sqlx::Error {
    fn from(err: UnknownStatus) -> Self {
        sqlx::Error::Decode(Box::new(err))
    }
}
