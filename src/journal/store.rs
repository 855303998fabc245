use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::event::{DomainEvent, EventEnvelope};
use crate::error::EngineResult;

// ============================================================================
// Journal Store - Append-only event log per aggregate
// ============================================================================
//
// Appends always run inside the caller's write transaction, so an event is
// journaled if and only if the state change it describes commits. Sequence
// numbers are contiguous per aggregate; the UNIQUE constraint on
// (aggregate_id, sequence_number) rejects a concurrent duplicate.
//
// ============================================================================

/// Append a single event and return the envelope as written.
pub async fn append<E: DomainEvent>(
    conn: &mut SqliteConnection,
    aggregate_type: &str,
    aggregate_id: Uuid,
    event: E,
    correlation_id: Uuid,
    user_id: Option<Uuid>,
    at: DateTime<Utc>,
) -> EngineResult<EventEnvelope<E>> {
    let current: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(sequence_number), 0) FROM journal WHERE aggregate_id = ?",
    )
    .bind(aggregate_id)
    .fetch_one(&mut *conn)
    .await?;

    let mut envelope = EventEnvelope::new(aggregate_type, aggregate_id, current + 1, event, correlation_id)
        .recorded_at(at);
    if let Some(user_id) = user_id {
        envelope = envelope.with_user(user_id);
    }

    let payload = serde_json::to_string(&envelope.event_data)?;

    sqlx::query(
        "INSERT INTO journal (
            event_id, aggregate_id, aggregate_type, sequence_number, event_type,
            payload, correlation_id, user_id, recorded_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(envelope.event_id)
    .bind(envelope.aggregate_id)
    .bind(&envelope.aggregate_type)
    .bind(envelope.sequence_number)
    .bind(&envelope.event_type)
    .bind(payload)
    .bind(envelope.correlation_id)
    .bind(envelope.user_id)
    .bind(envelope.recorded_at)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        aggregate_id = %aggregate_id,
        aggregate_type = %aggregate_type,
        sequence_number = envelope.sequence_number,
        event_type = %envelope.event_type,
        "Journaled event"
    );

    Ok(envelope)
}

/// Load all events for an aggregate in sequence order.
pub async fn load<E: DomainEvent>(
    pool: &SqlitePool,
    aggregate_id: Uuid,
) -> EngineResult<Vec<EventEnvelope<E>>> {
    let rows = sqlx::query(
        "SELECT event_id, aggregate_id, aggregate_type, sequence_number, event_type,
                payload, correlation_id, user_id, recorded_at
         FROM journal
         WHERE aggregate_id = ?
         ORDER BY sequence_number ASC",
    )
    .bind(aggregate_id)
    .fetch_all(pool)
    .await?;

    let mut events = Vec::with_capacity(rows.len());
    for row in &rows {
        events.push(envelope_from_row(row)?);
    }

    tracing::debug!(aggregate_id = %aggregate_id, count = events.len(), "Loaded journal");
    Ok(events)
}

fn envelope_from_row<E: DomainEvent>(row: &SqliteRow) -> EngineResult<EventEnvelope<E>> {
    let payload: String = row.try_get("payload")?;

    Ok(EventEnvelope {
        event_id: row.try_get("event_id")?,
        aggregate_id: row.try_get("aggregate_id")?,
        aggregate_type: row.try_get("aggregate_type")?,
        sequence_number: row.try_get("sequence_number")?,
        event_type: row.try_get("event_type")?,
        event_data: serde_json::from_str(&payload)?,
        correlation_id: row.try_get("correlation_id")?,
        user_id: row.try_get("user_id")?,
        recorded_at: row.try_get("recorded_at")?,
    })
}
