use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::value_objects::{DateRange, Reservation, ReservationStatus, Variant};
use crate::error::EngineResult;

// ============================================================================
// Inventory Repository - variants and reservations tables
// ============================================================================

pub async fn fetch_variant(conn: &mut SqliteConnection, id: Uuid) -> EngineResult<Option<Variant>> {
    let row = sqlx::query(
        "SELECT id, product_id, size, color, stock, daily_rate FROM variants WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(variant_from_row).transpose()?)
}

/// Variant already registered under the same (product, size, color).
pub async fn find_variant_by_key(
    conn: &mut SqliteConnection,
    product_id: Uuid,
    size: &str,
    color: &str,
) -> EngineResult<Option<Variant>> {
    let row = sqlx::query(
        "SELECT id, product_id, size, color, stock, daily_rate
         FROM variants
         WHERE product_id = ? AND size = ? AND color = ?",
    )
    .bind(product_id)
    .bind(size)
    .bind(color)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(variant_from_row).transpose()?)
}

pub async fn upsert_variant(conn: &mut SqliteConnection, variant: &Variant) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO variants (id, product_id, size, color, stock, daily_rate)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (id) DO UPDATE SET
            product_id = excluded.product_id,
            size = excluded.size,
            color = excluded.color,
            stock = excluded.stock,
            daily_rate = excluded.daily_rate",
    )
    .bind(variant.id)
    .bind(variant.product_id)
    .bind(&variant.size)
    .bind(&variant.color)
    .bind(variant.stock)
    .bind(variant.daily_rate)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn active_reservations(
    conn: &mut SqliteConnection,
    variant_id: Uuid,
) -> EngineResult<Vec<Reservation>> {
    let rows = sqlx::query(
        "SELECT id, variant_id, order_id, quantity, start_date, end_date, status, created_at
         FROM reservations
         WHERE variant_id = ? AND status = ?",
    )
    .bind(variant_id)
    .bind(ReservationStatus::Active.as_str())
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(reservation_from_row).collect::<Result<_, _>>()?)
}

pub async fn reservations_for_order(
    conn: &mut SqliteConnection,
    order_id: Uuid,
) -> EngineResult<Vec<Reservation>> {
    let rows = sqlx::query(
        "SELECT id, variant_id, order_id, quantity, start_date, end_date, status, created_at
         FROM reservations
         WHERE order_id = ?
         ORDER BY created_at ASC, id ASC",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(reservation_from_row).collect::<Result<_, _>>()?)
}

pub async fn insert_reservation(conn: &mut SqliteConnection, reservation: &Reservation) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO reservations (id, variant_id, order_id, quantity, start_date, end_date, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(reservation.id)
    .bind(reservation.variant_id)
    .bind(reservation.order_id)
    .bind(reservation.quantity)
    .bind(reservation.range.start)
    .bind(reservation.range.end)
    .bind(reservation.status.as_str())
    .bind(reservation.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Release every active reservation held by an order. Returns how many
/// were released.
pub async fn release_for_order(conn: &mut SqliteConnection, order_id: Uuid) -> EngineResult<u64> {
    let result = sqlx::query("UPDATE reservations SET status = ? WHERE order_id = ? AND status = ?")
        .bind(ReservationStatus::Released.as_str())
        .bind(order_id)
        .bind(ReservationStatus::Active.as_str())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

fn variant_from_row(row: &SqliteRow) -> Result<Variant, sqlx::Error> {
    Ok(Variant {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        size: row.try_get("size")?,
        color: row.try_get("color")?,
        stock: row.try_get("stock")?,
        daily_rate: row.try_get("daily_rate")?,
    })
}

fn reservation_from_row(row: &SqliteRow) -> Result<Reservation, sqlx::Error> {
    let status: String = row.try_get("status")?;

    Ok(Reservation {
        id: row.try_get("id")?,
        variant_id: row.try_get("variant_id")?,
        order_id: row.try_get("order_id")?,
        quantity: row.try_get("quantity")?,
        range: DateRange {
            start: row.try_get("start_date")?,
            end: row.try_get("end_date")?,
        },
        status: status.parse::<ReservationStatus>()?,
        created_at: row.try_get("created_at")?,
    })
}
