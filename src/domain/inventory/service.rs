use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use super::availability::AvailabilityCalculator;
use super::repository;
use super::value_objects::{Availability, DateRange, Reservation, Variant, VariantSpec};
use crate::actor::Actor;
use crate::db::Db;
use crate::error::{EngineError, EngineResult};
use crate::metrics::Metrics;

// ============================================================================
// Inventory Service
// ============================================================================
//
// Variant registration and availability reads. Reservations themselves are
// only created and released by the order lifecycle.
//
// ============================================================================

#[derive(Clone)]
pub struct InventoryService {
    db: Db,
    calculator: AvailabilityCalculator,
    metrics: Arc<Metrics>,
}

impl InventoryService {
    pub fn new(db: Db, calculator: AvailabilityCalculator, metrics: Arc<Metrics>) -> Self {
        Self {
            db,
            calculator,
            metrics,
        }
    }

    pub fn calculator(&self) -> AvailabilityCalculator {
        self.calculator
    }

    pub async fn get_variant(&self, variant_id: Uuid) -> EngineResult<Variant> {
        let mut conn = self.db.pool().acquire().await?;
        repository::fetch_variant(&mut conn, variant_id)
            .await?
            .ok_or_else(|| EngineError::not_found("variant", variant_id))
    }

    pub async fn get_availability(
        &self,
        variant_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Availability> {
        let range = DateRange::new(start, end)?;

        let mut conn = self.db.pool().acquire().await?;
        let variant = repository::fetch_variant(&mut conn, variant_id)
            .await?
            .ok_or_else(|| EngineError::not_found("variant", variant_id))?;
        let available = self.calculator.available_in(&mut conn, &variant, &range).await?;

        tracing::debug!(variant_id = %variant_id, range = %range, available, "Availability computed");

        Ok(Availability {
            variant_id,
            start_date: start,
            end_date: end,
            available,
        })
    }

    /// Register a variant or update its stock and rate.
    ///
    /// Stock may not drop below the number of units already reserved on the
    /// busiest day.
    pub async fn upsert_variant(&self, actor: &Actor, variant_id: Uuid, spec: VariantSpec) -> EngineResult<Variant> {
        actor.ensure_admin("upsertVariant")?;
        spec.validate()?;

        let mut tx = self.db.begin_write().await?;

        if let Some(existing) =
            repository::find_variant_by_key(tx.conn(), spec.product_id, &spec.size, &spec.color).await?
        {
            if existing.id != variant_id {
                return Err(EngineError::InvalidRange(format!(
                    "product {} in {}/{} is already registered as variant {}",
                    spec.product_id, spec.size, spec.color, existing.id
                )));
            }
        }

        let reservations = repository::active_reservations(tx.conn(), variant_id).await?;
        let peak = self.calculator.peak_usage(&reservations);
        if spec.stock < peak.units {
            self.metrics.record_stock_conflict("upsert");
            let day = peak.on.unwrap_or_default();
            return Err(EngineError::InsufficientStock {
                item_index: 0,
                variant_id,
                start_date: day,
                end_date: day,
                requested: peak.units,
                available: spec.stock,
            });
        }

        let variant = spec.into_variant(variant_id);
        repository::upsert_variant(tx.conn(), &variant).await?;
        tx.commit().await?;

        tracing::info!(
            variant_id = %variant.id,
            product_id = %variant.product_id,
            size = %variant.size,
            color = %variant.color,
            stock = variant.stock,
            daily_rate = variant.daily_rate,
            "Variant upserted"
        );

        Ok(variant)
    }

    pub async fn reservations_for_order(&self, order_id: Uuid) -> EngineResult<Vec<Reservation>> {
        let mut conn = self.db.pool().acquire().await?;
        repository::reservations_for_order(&mut conn, order_id).await
    }
}
