use sqlx::SqlitePool;

// Dates are ISO-8601 TEXT so lexical order matches calendar order.
const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS variants (
        id          BLOB PRIMARY KEY,
        product_id  BLOB NOT NULL,
        size        TEXT NOT NULL,
        color       TEXT NOT NULL,
        stock       INTEGER NOT NULL CHECK (stock >= 0),
        daily_rate  INTEGER NOT NULL CHECK (daily_rate >= 0),
        UNIQUE (product_id, size, color)
    )",
    "CREATE TABLE IF NOT EXISTS photo_services (
        id     BLOB PRIMARY KEY,
        name   TEXT NOT NULL,
        price  INTEGER NOT NULL CHECK (price >= 0)
    )",
    "CREATE TABLE IF NOT EXISTS reservations (
        id          BLOB PRIMARY KEY,
        variant_id  BLOB NOT NULL REFERENCES variants (id),
        order_id    BLOB NOT NULL,
        quantity    INTEGER NOT NULL CHECK (quantity > 0),
        start_date  TEXT NOT NULL,
        end_date    TEXT NOT NULL,
        status      TEXT NOT NULL,
        created_at  TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS reservations_by_variant ON reservations (variant_id, status)",
    "CREATE INDEX IF NOT EXISTS reservations_by_order ON reservations (order_id)",
    "CREATE TABLE IF NOT EXISTS cart_items (
        id          BLOB PRIMARY KEY,
        user_id     BLOB NOT NULL,
        variant_id  BLOB NOT NULL REFERENCES variants (id),
        quantity    INTEGER NOT NULL CHECK (quantity > 0),
        start_date  TEXT NOT NULL,
        end_date    TEXT NOT NULL,
        position    INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS cart_items_by_user ON cart_items (user_id, position)",
    "CREATE TABLE IF NOT EXISTS orders (
        id          BLOB PRIMARY KEY,
        user_id     BLOB NOT NULL,
        lines       TEXT NOT NULL,
        total       INTEGER NOT NULL,
        status      TEXT NOT NULL,
        payment     TEXT,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS orders_by_user ON orders (user_id, created_at)",
    "CREATE TABLE IF NOT EXISTS bookings (
        id             BLOB PRIMARY KEY,
        user_id        BLOB NOT NULL,
        service_id     BLOB NOT NULL REFERENCES photo_services (id),
        shooting_date  TEXT NOT NULL,
        shooting_time  TEXT NOT NULL,
        location       TEXT NOT NULL,
        price          INTEGER NOT NULL,
        status         TEXT NOT NULL,
        payment        TEXT,
        created_at     TEXT NOT NULL,
        updated_at     TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS bookings_by_slot ON bookings (service_id, shooting_date, shooting_time)",
    "CREATE TABLE IF NOT EXISTS journal (
        event_id         BLOB PRIMARY KEY,
        aggregate_id     BLOB NOT NULL,
        aggregate_type   TEXT NOT NULL,
        sequence_number  INTEGER NOT NULL,
        event_type       TEXT NOT NULL,
        payload          TEXT NOT NULL,
        correlation_id   BLOB NOT NULL,
        user_id          BLOB,
        recorded_at      TEXT NOT NULL,
        UNIQUE (aggregate_id, sequence_number)
    )",
];

pub(super) async fn apply(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::debug!(statements = STATEMENTS.len(), "Schema applied");
    Ok(())
}
