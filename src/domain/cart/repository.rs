use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::value_objects::CartItem;
use crate::domain::inventory::DateRange;
use crate::error::EngineResult;

/// Items in insertion order.
pub async fn list_items(conn: &mut SqliteConnection, user_id: Uuid) -> EngineResult<Vec<CartItem>> {
    let rows = sqlx::query(
        "SELECT id, user_id, variant_id, quantity, start_date, end_date, position
         FROM cart_items
         WHERE user_id = ?
         ORDER BY position ASC",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(item_from_row).collect::<Result<_, _>>()?)
}

pub async fn next_position(conn: &mut SqliteConnection, user_id: Uuid) -> EngineResult<i64> {
    let position: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM cart_items WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(position)
}

pub async fn insert_item(conn: &mut SqliteConnection, item: &CartItem) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO cart_items (id, user_id, variant_id, quantity, start_date, end_date, position)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(item.id)
    .bind(item.user_id)
    .bind(item.variant_id)
    .bind(item.quantity)
    .bind(item.range.start)
    .bind(item.range.end)
    .bind(item.position)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_item(conn: &mut SqliteConnection, item: &CartItem) -> EngineResult<()> {
    sqlx::query("UPDATE cart_items SET quantity = ?, start_date = ?, end_date = ? WHERE id = ?")
        .bind(item.quantity)
        .bind(item.range.start)
        .bind(item.range.end)
        .bind(item.id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn delete_item(conn: &mut SqliteConnection, item_id: Uuid) -> EngineResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE id = ?")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn clear(conn: &mut SqliteConnection, user_id: Uuid) -> EngineResult<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

fn item_from_row(row: &SqliteRow) -> Result<CartItem, sqlx::Error> {
    Ok(CartItem {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        variant_id: row.try_get("variant_id")?,
        quantity: row.try_get("quantity")?,
        range: DateRange {
            start: row.try_get("start_date")?,
            end: row.try_get("end_date")?,
        },
        position: row.try_get("position")?,
    })
}
