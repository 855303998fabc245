use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::value_objects::{Order, OrderStatus};
use crate::error::EngineResult;
use crate::lifecycle::LifecycleStatus;

// Lines and payment are stored as JSON snapshots.

pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> EngineResult<()> {
    let lines = serde_json::to_string(&order.lines)?;
    let payment = order.payment.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query(
        "INSERT INTO orders (id, user_id, lines, total, status, payment, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(lines)
    .bind(order.total)
    .bind(order.status.as_str())
    .bind(payment)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Persist the mutable part of an order: status, payment and timestamp.
pub async fn update_order(conn: &mut SqliteConnection, order: &Order) -> EngineResult<()> {
    let payment = order.payment.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query("UPDATE orders SET status = ?, payment = ?, updated_at = ? WHERE id = ?")
        .bind(order.status.as_str())
        .bind(payment)
        .bind(order.updated_at)
        .bind(order.id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn fetch_order(conn: &mut SqliteConnection, id: Uuid) -> EngineResult<Option<Order>> {
    let row = sqlx::query(
        "SELECT id, user_id, lines, total, status, payment, created_at, updated_at
         FROM orders WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(order_from_row).transpose()
}

/// A user's orders, newest first.
pub async fn list_for_user(conn: &mut SqliteConnection, user_id: Uuid) -> EngineResult<Vec<Order>> {
    let rows = sqlx::query(
        "SELECT id, user_id, lines, total, status, payment, created_at, updated_at
         FROM orders WHERE user_id = ?
         ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(order_from_row).collect()
}

fn order_from_row(row: &SqliteRow) -> EngineResult<Order> {
    let lines: String = row.try_get("lines")?;
    let status: String = row.try_get("status")?;
    let payment: Option<String> = row.try_get("payment")?;

    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        lines: serde_json::from_str(&lines)?,
        total: row.try_get("total")?,
        status: status.parse::<OrderStatus>().map_err(sqlx::Error::from)?,
        payment: payment.as_deref().map(serde_json::from_str).transpose()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
