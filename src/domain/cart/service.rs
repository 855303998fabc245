use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::repository;
use super::value_objects::{AddCartItem, CartItem, CartLine, CartView};
use crate::clock::Clock;
use crate::db::Db;
use crate::domain::inventory::{self, AvailabilityCalculator, DateRange, Variant};
use crate::error::{EngineError, EngineResult};
use crate::metrics::Metrics;

// ============================================================================
// Cart Service
// ============================================================================
//
// Availability checks here are advisory. Nothing is reserved until the cart
// is converted into an order, which re-checks every line.
//
// ============================================================================

#[derive(Clone)]
pub struct CartService {
    db: Db,
    calculator: AvailabilityCalculator,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
}

impl CartService {
    pub fn new(db: Db, calculator: AvailabilityCalculator, clock: Arc<dyn Clock>, metrics: Arc<Metrics>) -> Self {
        Self {
            db,
            calculator,
            clock,
            metrics,
        }
    }

    /// Add a line, or grow an existing line for the same variant and dates.
    pub async fn add_item(&self, user_id: Uuid, request: AddCartItem) -> EngineResult<CartItem> {
        if request.quantity < 1 {
            return Err(EngineError::InvalidRange(format!(
                "quantity must be at least 1, got {}",
                request.quantity
            )));
        }
        let range = DateRange::rental(request.start_date, request.end_date, self.clock.today())?;

        let mut tx = self.db.begin_write().await?;
        let variant = load_variant(tx.conn(), request.variant_id).await?;
        let items = repository::list_items(tx.conn(), user_id).await?;

        let existing = items
            .into_iter()
            .find(|item| item.variant_id == request.variant_id && item.range == range);

        let item = match existing {
            Some(mut item) => {
                item.quantity = item.quantity.checked_add(request.quantity).ok_or_else(|| {
                    EngineError::InvalidRange(format!(
                        "quantity {} on top of {} is too large",
                        request.quantity, item.quantity
                    ))
                })?;
                self.ensure_available(tx.conn(), &variant, &range, item.quantity).await?;
                repository::update_item(tx.conn(), &item).await?;
                item
            }
            None => {
                self.ensure_available(tx.conn(), &variant, &range, request.quantity).await?;
                let item = CartItem {
                    id: Uuid::now_v7(),
                    user_id,
                    variant_id: request.variant_id,
                    quantity: request.quantity,
                    range,
                    position: repository::next_position(tx.conn(), user_id).await?,
                };
                repository::insert_item(tx.conn(), &item).await?;
                item
            }
        };
        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            variant_id = %item.variant_id,
            quantity = item.quantity,
            range = %item.range,
            "Cart item saved"
        );

        Ok(item)
    }

    /// Move a line to new dates. On any failure the line is left as it was.
    pub async fn update_dates(
        &self,
        user_id: Uuid,
        item_index: usize,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<CartItem> {
        let range = DateRange::rental(start, end, self.clock.today())?;

        let mut tx = self.db.begin_write().await?;
        let mut item = item_at(tx.conn(), user_id, item_index).await?;
        let variant = load_variant(tx.conn(), item.variant_id).await?;
        self.ensure_available(tx.conn(), &variant, &range, item.quantity).await?;

        item.range = range;
        repository::update_item(tx.conn(), &item).await?;
        tx.commit().await?;

        tracing::debug!(user_id = %user_id, item_index, range = %range, "Cart item dates updated");
        Ok(item)
    }

    pub async fn remove_item(&self, user_id: Uuid, item_index: usize) -> EngineResult<()> {
        let mut tx = self.db.begin_write().await?;
        let item = item_at(tx.conn(), user_id, item_index).await?;
        repository::delete_item(tx.conn(), item.id).await?;
        tx.commit().await?;

        tracing::debug!(user_id = %user_id, item_index, "Cart item removed");
        Ok(())
    }

    pub async fn clear(&self, user_id: Uuid) -> EngineResult<()> {
        let mut tx = self.db.begin_write().await?;
        let removed = repository::clear(tx.conn(), user_id).await?;
        tx.commit().await?;

        tracing::debug!(user_id = %user_id, removed, "Cart cleared");
        Ok(())
    }

    /// Cart lines in insertion order, priced at current rates.
    pub async fn get_cart(&self, user_id: Uuid) -> EngineResult<CartView> {
        let mut conn = self.db.pool().acquire().await?;
        let items = repository::list_items(&mut conn, user_id).await?;

        let mut lines = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let variant = load_variant(&mut conn, item.variant_id).await?;
            lines.push(CartLine::priced(index, item, &variant)?);
        }

        CartView::new(user_id, lines)
    }

    async fn ensure_available(
        &self,
        conn: &mut SqliteConnection,
        variant: &Variant,
        range: &DateRange,
        requested: i64,
    ) -> EngineResult<()> {
        let available = self.calculator.available_in(conn, variant, range).await?;
        if available < requested {
            self.metrics.record_stock_conflict("cart");
            tracing::debug!(
                variant_id = %variant.id,
                range = %range,
                requested,
                available,
                "Cart line exceeds availability"
            );
            return Err(EngineError::OutOfStock {
                variant_id: variant.id,
                requested,
                available,
            });
        }
        Ok(())
    }
}

async fn load_variant(conn: &mut SqliteConnection, variant_id: Uuid) -> EngineResult<Variant> {
    inventory::repository::fetch_variant(conn, variant_id)
        .await?
        .ok_or_else(|| EngineError::not_found("variant", variant_id))
}

async fn item_at(conn: &mut SqliteConnection, user_id: Uuid, item_index: usize) -> EngineResult<CartItem> {
    repository::list_items(conn, user_id)
        .await?
        .into_iter()
        .nth(item_index)
        .ok_or_else(|| EngineError::not_found("cart item", item_index))
}
