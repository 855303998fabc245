use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::inventory::{sum_amounts, DateRange, Variant};
use crate::error::EngineResult;

// ============================================================================
// Cart Value Objects
// ============================================================================

/// One line of a user's cart. Advisory only: holds no stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    pub range: DateRange,
    pub position: i64,
}

/// Request body for adding a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItem {
    pub variant_id: Uuid,
    pub quantity: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Cart line priced at the variant's current rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub index: usize,
    pub item_id: Uuid,
    pub variant_id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_rate: i64,
    pub days: i64,
    pub line_total: i64,
}

impl CartLine {
    pub fn priced(index: usize, item: &CartItem, variant: &Variant) -> EngineResult<Self> {
        Ok(Self {
            index,
            item_id: item.id,
            variant_id: item.variant_id,
            product_id: variant.product_id,
            size: variant.size.clone(),
            color: variant.color.clone(),
            quantity: item.quantity,
            start_date: item.range.start,
            end_date: item.range.end,
            daily_rate: variant.daily_rate,
            days: item.range.days(),
            line_total: variant.rental_price(&item.range, item.quantity)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub user_id: Uuid,
    pub lines: Vec<CartLine>,
    pub total: i64,
}

impl CartView {
    pub fn new(user_id: Uuid, lines: Vec<CartLine>) -> EngineResult<Self> {
        let total = sum_amounts(lines.iter().map(|line| line.line_total))?;
        Ok(Self { user_id, lines, total })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priced_line_counts_both_end_days() {
        let variant = Variant {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            size: "S".to_string(),
            color: "champagne".to_string(),
            stock: 1,
            daily_rate: 2_500,
        };
        let item = CartItem {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            variant_id: variant.id,
            quantity: 2,
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            )
            .unwrap(),
            position: 0,
        };

        let line = CartLine::priced(0, &item, &variant).unwrap();
        let view = CartView::new(item.user_id, vec![line.clone()]).unwrap();

        assert_eq!(line.days, 3);
        assert_eq!(line.line_total, 15_000);
        assert_eq!(view.total, 15_000);
    }
}
