// ============================================================================
// Storage Layer - SQLite tables behind serialized write transactions
// ============================================================================
//
// Variant stock, reservations, carts, orders, bookings and the journal live
// in relational tables. Reads go straight to the pool; every read-then-write
// runs inside a `WriteTx`, which holds the process-wide writer lock for the
// lifetime of one SQLite transaction. That makes an availability check and
// the reservation insert that depends on it atomic with respect to every
// other writer.
//
// ============================================================================

mod schema;

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Debug)]
pub struct Db {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl Db {
    /// Connect and apply the schema.
    ///
    /// In-memory databases are bound to a single connection that is never
    /// recycled, otherwise each pooled connection would see its own empty
    /// database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let max_connections = if in_memory { 1 } else { max_connections.max(1) };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(if in_memory { 1 } else { 0 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        schema::apply(&pool).await?;

        tracing::info!(url = %url, max_connections, "Storage ready");

        Ok(Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Fresh private in-memory database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a serialized write transaction.
    pub async fn begin_write(&self) -> Result<WriteTx, sqlx::Error> {
        let guard = self.writer.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(WriteTx { tx, _guard: guard })
    }

    /// Cheap liveness probe used by `/health`.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Write transaction holding the writer lock. Dropping it without `commit`
/// rolls the transaction back and releases the lock.
pub struct WriteTx {
    tx: Transaction<'static, Sqlite>,
    _guard: OwnedMutexGuard<()>,
}

impl WriteTx {
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_schema_is_shared_across_calls() {
        let db = Db::in_memory().await.unwrap();

        let mut tx = db.begin_write().await.unwrap();
        sqlx::query("INSERT INTO photo_services (id, name, price) VALUES (?, ?, ?)")
            .bind(uuid::Uuid::new_v4())
            .bind("Garden shoot")
            .bind(15_000_i64)
            .execute(tx.conn())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photo_services")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_dropped_write_rolls_back() {
        let db = Db::in_memory().await.unwrap();

        {
            let mut tx = db.begin_write().await.unwrap();
            sqlx::query("INSERT INTO photo_services (id, name, price) VALUES (?, ?, ?)")
                .bind(uuid::Uuid::new_v4())
                .bind("Studio portrait")
                .bind(8_000_i64)
                .execute(tx.conn())
                .await
                .unwrap();
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photo_services")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
