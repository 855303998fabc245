use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::value_objects::{Booking, BookingStatus, PhotoService, TimeSlot};
use crate::error::EngineResult;
use crate::lifecycle::LifecycleStatus;

pub async fn fetch_service(conn: &mut SqliteConnection, id: Uuid) -> EngineResult<Option<PhotoService>> {
    let row = sqlx::query("SELECT id, name, price FROM photo_services WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(Some(PhotoService {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
        })),
        None => Ok(None),
    }
}

pub async fn upsert_service(conn: &mut SqliteConnection, service: &PhotoService) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO photo_services (id, name, price) VALUES (?, ?, ?)
         ON CONFLICT (id) DO UPDATE SET name = excluded.name, price = excluded.price",
    )
    .bind(service.id)
    .bind(&service.name)
    .bind(service.price)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn insert_booking(conn: &mut SqliteConnection, booking: &Booking) -> EngineResult<()> {
    let payment = booking.payment.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query(
        "INSERT INTO bookings (
            id, user_id, service_id, shooting_date, shooting_time, location,
            price, status, payment, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(booking.id)
    .bind(booking.user_id)
    .bind(booking.service_id)
    .bind(booking.shooting_date)
    .bind(booking.shooting_time.as_str())
    .bind(&booking.location)
    .bind(booking.price)
    .bind(booking.status.as_str())
    .bind(payment)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_booking(conn: &mut SqliteConnection, booking: &Booking) -> EngineResult<()> {
    let payment = booking.payment.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query("UPDATE bookings SET location = ?, status = ?, payment = ?, updated_at = ? WHERE id = ?")
        .bind(&booking.location)
        .bind(booking.status.as_str())
        .bind(payment)
        .bind(booking.updated_at)
        .bind(booking.id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn fetch_booking(conn: &mut SqliteConnection, id: Uuid) -> EngineResult<Option<Booking>> {
    let row = sqlx::query(
        "SELECT id, user_id, service_id, shooting_date, shooting_time, location,
                price, status, payment, created_at, updated_at
         FROM bookings WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(booking_from_row).transpose()
}

pub async fn list_for_user(conn: &mut SqliteConnection, user_id: Uuid) -> EngineResult<Vec<Booking>> {
    let rows = sqlx::query(
        "SELECT id, user_id, service_id, shooting_date, shooting_time, location,
                price, status, payment, created_at, updated_at
         FROM bookings WHERE user_id = ?
         ORDER BY shooting_date ASC, shooting_time ASC",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(booking_from_row).collect()
}

/// Pending or confirmed bookings holding a service slot.
pub async fn active_at_slot(
    conn: &mut SqliteConnection,
    service_id: Uuid,
    date: NaiveDate,
    time: &TimeSlot,
) -> EngineResult<Vec<Booking>> {
    let rows = sqlx::query(
        "SELECT id, user_id, service_id, shooting_date, shooting_time, location,
                price, status, payment, created_at, updated_at
         FROM bookings
         WHERE service_id = ? AND shooting_date = ? AND shooting_time = ?
           AND status IN (?, ?)
         ORDER BY created_at ASC",
    )
    .bind(service_id)
    .bind(date)
    .bind(time.as_str())
    .bind(BookingStatus::ACTIVE[0].as_str())
    .bind(BookingStatus::ACTIVE[1].as_str())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(booking_from_row).collect()
}

fn booking_from_row(row: &SqliteRow) -> EngineResult<Booking> {
    let time: String = row.try_get("shooting_time")?;
    let status: String = row.try_get("status")?;
    let payment: Option<String> = row.try_get("payment")?;

    Ok(Booking {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        service_id: row.try_get("service_id")?,
        shooting_date: row.try_get("shooting_date")?,
        shooting_time: TimeSlot::parse(&time)?,
        location: row.try_get("location")?,
        price: row.try_get("price")?,
        status: status.parse::<BookingStatus>().map_err(sqlx::Error::from)?,
        payment: payment.as_deref().map(serde_json::from_str).transpose()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
