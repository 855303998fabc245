use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use super::machine::{invalid_transition, LifecycleRecord, LifecycleStatus, ResourceHook};
use crate::actor::Actor;
use crate::clock::Clock;
use crate::db::Db;
use crate::error::{EngineError, EngineResult};
use crate::journal;
use crate::metrics::Metrics;
use crate::payment::{PaymentDetails, PaymentGateway, PaymentMethod, PaymentRequest};

// ============================================================================
// Lifecycle Handler
// ============================================================================
//
// Orchestrates: load → authorize → check edge → hook → persist → journal
//
// Everything after the load runs in one write transaction; a failing hook
// or journal append rolls the whole transition back.
//
// ============================================================================

/// Who may request a given transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    OwnerOrAdmin,
    AdminOnly,
}

pub struct Lifecycle<R, H> {
    db: Db,
    hook: H,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    _record: PhantomData<fn() -> R>,
}

impl<R, H> Lifecycle<R, H>
where
    R: LifecycleRecord,
    H: ResourceHook<R>,
{
    pub fn new(db: Db, hook: H, clock: Arc<dyn Clock>, metrics: Arc<Metrics>) -> Self {
        Self {
            db,
            hook,
            clock,
            metrics,
            _record: PhantomData,
        }
    }

    /// Read a record outside any write transaction.
    pub async fn get(&self, id: Uuid) -> EngineResult<R> {
        let mut conn = self.db.pool().acquire().await?;
        R::fetch(&mut *conn, id)
            .await?
            .ok_or_else(|| EngineError::not_found(R::AGGREGATE, id))
    }

    /// Move a record along one edge of its lifecycle.
    pub async fn transition(
        &self,
        id: Uuid,
        to: R::Status,
        actor: &Actor,
        authority: Authority,
    ) -> EngineResult<R> {
        let correlation_id = Uuid::now_v7();
        let now = self.clock.now();

        let mut tx = self.db.begin_write().await?;
        let mut record = R::fetch(tx.conn(), id)
            .await?
            .ok_or_else(|| EngineError::not_found(R::AGGREGATE, id))?;

        match authority {
            Authority::AdminOnly => actor.ensure_admin("status update")?,
            Authority::OwnerOrAdmin => actor.ensure_owner_or_admin(record.owner_id(), R::AGGREGATE)?,
        }

        let from = record.status();
        if !from.can_transition_to(to) {
            tracing::debug!(
                aggregate = R::AGGREGATE,
                id = %id,
                from = %from,
                to = %to,
                "Rejected transition"
            );
            return Err(invalid_transition(R::AGGREGATE, from, to));
        }

        self.hook.on_transition(tx.conn(), &record, from, to).await?;

        record.apply_status(to, now);
        record.persist(tx.conn()).await?;
        journal::append(
            tx.conn(),
            R::AGGREGATE,
            id,
            R::status_changed_event(from, to, actor),
            correlation_id,
            Some(actor.user_id),
            now,
        )
        .await?;
        tx.commit().await?;

        self.metrics.record_transition(R::AGGREGATE, from.as_str(), to.as_str());
        tracing::info!(
            aggregate = R::AGGREGATE,
            id = %id,
            from = %from,
            to = %to,
            actor = %actor.user_id,
            correlation_id = %correlation_id,
            "🔁 Transition committed"
        );

        Ok(record)
    }

    /// Cancel on behalf of the owner or an admin.
    pub async fn cancel(&self, id: Uuid, actor: &Actor) -> EngineResult<R> {
        self.transition(id, <R::Status as LifecycleStatus>::CANCELLED, actor, Authority::OwnerOrAdmin)
            .await
    }

    /// Authorize a payment for the amount due and, on approval, record it
    /// and advance the status.
    ///
    /// The gateway call happens outside the write transaction. The status is
    /// checked again before the result is committed; a record that left the
    /// payable states or was paid in the meantime is not updated and the call
    /// fails with `InvalidTransition`. A failed authorization leaves the
    /// status alone.
    pub async fn process_payment(
        &self,
        id: Uuid,
        method: PaymentMethod,
        actor: &Actor,
        gateway: &PaymentGateway,
    ) -> EngineResult<R> {
        let correlation_id = Uuid::now_v7();

        let snapshot = self.get(id).await?;
        actor.ensure_owner_or_admin(snapshot.owner_id(), R::AGGREGATE)?;

        ensure_payable(&snapshot)?;

        let request = PaymentRequest {
            subject_id: id,
            subject_kind: R::AGGREGATE,
            payer_id: actor.user_id,
            amount: snapshot.amount_due(),
            method,
        };

        let receipt = match gateway.authorize(&request).await {
            Ok(receipt) => receipt,
            Err(err) => {
                let reason = err.to_string();
                let now = self.clock.now();
                let mut tx = self.db.begin_write().await?;
                journal::append(
                    tx.conn(),
                    R::AGGREGATE,
                    id,
                    R::payment_declined_event(&reason),
                    correlation_id,
                    Some(actor.user_id),
                    now,
                )
                .await?;
                tx.commit().await?;
                return Err(EngineError::PaymentFailed(reason));
            }
        };

        let now = self.clock.now();
        let mut tx = self.db.begin_write().await?;
        let mut record = R::fetch(tx.conn(), id)
            .await?
            .ok_or_else(|| EngineError::not_found(R::AGGREGATE, id))?;

        let current = record.status();
        if let Err(err) = ensure_payable(&record) {
            tracing::warn!(
                aggregate = R::AGGREGATE,
                id = %id,
                status = %current,
                paid = record.is_paid(),
                transaction_ref = %receipt.transaction_ref,
                "Payment authorized but record is no longer payable"
            );
            return Err(err);
        }

        let target = R::status_after_payment(current);
        if target != current {
            self.hook.on_transition(tx.conn(), &record, current, target).await?;
        }

        let details = PaymentDetails {
            method,
            transaction_ref: receipt.transaction_ref,
            amount: request.amount,
            paid_at: now,
        };

        journal::append(
            tx.conn(),
            R::AGGREGATE,
            id,
            R::payment_captured_event(&details),
            correlation_id,
            Some(actor.user_id),
            now,
        )
        .await?;
        if target != current {
            journal::append(
                tx.conn(),
                R::AGGREGATE,
                id,
                R::status_changed_event(current, target, actor),
                correlation_id,
                Some(actor.user_id),
                now,
            )
            .await?;
        }

        record.apply_payment(details, now);
        record.apply_status(target, now);
        record.persist(tx.conn()).await?;
        tx.commit().await?;

        if target != current {
            self.metrics.record_transition(R::AGGREGATE, current.as_str(), target.as_str());
        }
        tracing::info!(
            aggregate = R::AGGREGATE,
            id = %id,
            from = %current,
            to = %target,
            amount = request.amount,
            correlation_id = %correlation_id,
            "💳 Payment recorded"
        );

        Ok(record)
    }

    /// Journal entries for one record, oldest first.
    pub async fn history(&self, id: Uuid) -> EngineResult<Vec<journal::EventEnvelope<R::Event>>> {
        journal::load::<R::Event>(self.db.pool(), id).await
    }
}

/// Payable status and no payment captured yet.
fn ensure_payable<R: LifecycleRecord>(record: &R) -> EngineResult<()> {
    let status = record.status();
    if !status.is_payable() || record.is_paid() {
        return Err(invalid_transition(R::AGGREGATE, status, R::status_after_payment(status)));
    }
    Ok(())
}
