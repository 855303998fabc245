use std::fmt::{Debug, Display};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::actor::Actor;
use crate::error::{EngineError, EngineResult};
use crate::journal::DomainEvent;
use crate::payment::PaymentDetails;

// ============================================================================
// Lifecycle Core - Generic state machine abstractions
// ============================================================================
//
// A lifecycle is an allowed-edge table over a status enum plus a resource
// hook that runs inside the transition's write transaction. Orders and
// photography bookings are two instantiations of the same machinery.
//
// ============================================================================

/// Status enum of a lifecycle together with its edge table.
pub trait LifecycleStatus: Copy + Eq + Debug + Display + Send + Sync + 'static {
    /// Forward edges. Cancellation is covered by `CANCELLABLE`.
    const EDGES: &'static [(Self, Self)];

    const CANCELLED: Self;

    /// Statuses from which `CANCELLED` may be entered.
    const CANCELLABLE: &'static [Self];

    const TERMINAL: &'static [Self];

    /// Statuses from which a payment may be taken.
    const PAYABLE: &'static [Self];

    fn as_str(self) -> &'static str;

    fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    fn is_payable(self) -> bool {
        Self::PAYABLE.contains(&self)
    }

    fn can_transition_to(self, next: Self) -> bool {
        if next == Self::CANCELLED {
            Self::CANCELLABLE.contains(&self)
        } else {
            Self::EDGES.contains(&(self, next))
        }
    }
}

/// A persisted entity driven through a lifecycle.
#[async_trait]
pub trait LifecycleRecord: Send + Sync + Sized {
    type Status: LifecycleStatus;
    type Event: DomainEvent;

    /// Aggregate name used in the journal, metrics and errors.
    const AGGREGATE: &'static str;

    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Uuid;
    fn status(&self) -> Self::Status;
    fn amount_due(&self) -> i64;

    /// A captured payment is already on the record.
    fn is_paid(&self) -> bool;

    fn apply_status(&mut self, status: Self::Status, at: DateTime<Utc>);
    fn apply_payment(&mut self, details: PaymentDetails, at: DateTime<Utc>);

    /// Status a successful payment moves the record to from `from`.
    fn status_after_payment(from: Self::Status) -> Self::Status;

    fn status_changed_event(from: Self::Status, to: Self::Status, actor: &Actor) -> Self::Event;
    fn payment_captured_event(details: &PaymentDetails) -> Self::Event;
    fn payment_declined_event(reason: &str) -> Self::Event;

    async fn fetch(conn: &mut SqliteConnection, id: Uuid) -> EngineResult<Option<Self>>;
    async fn persist(&self, conn: &mut SqliteConnection) -> EngineResult<()>;
}

/// Side effects bound to a transition, run before the new status is written.
/// Returning an error aborts the transition.
#[async_trait]
pub trait ResourceHook<R: LifecycleRecord>: Send + Sync {
    async fn on_transition(
        &self,
        conn: &mut SqliteConnection,
        record: &R,
        from: R::Status,
        to: R::Status,
    ) -> EngineResult<()>;
}

pub(crate) fn invalid_transition<S: LifecycleStatus>(aggregate: &'static str, from: S, to: S) -> EngineError {
    EngineError::InvalidTransition {
        entity: aggregate,
        from: from.to_string(),
        to: to.to_string(),
    }
}
