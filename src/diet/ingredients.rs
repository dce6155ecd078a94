use std::collections::BTreeMap;

use time::Date;
use uuid::Uuid;

use crate::diet::model::MeasurementUnit;
use crate::store::{DietStore, IngredientUsage, StoreResult};

/// Ingredient quantities are recorded per 100-unit serving of the meal.
/// Meals with any other base serving would be mis-scaled here.
pub const SERVING_BASE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct IngredientTotal {
    pub name: String,
    pub unit: MeasurementUnit,
    pub total_quantity: f64,
}

/// Sums `base * meal_quantity / 100` per (name, unit), sorted by name then unit.
pub fn aggregate<I>(rows: I) -> Vec<IngredientTotal>
where
    I: IntoIterator<Item = IngredientUsage>,
{
    let mut totals: BTreeMap<(String, MeasurementUnit), f64> = BTreeMap::new();
    for row in rows {
        *totals.entry((row.ingredient_name, row.unit)).or_default() +=
            row.base_quantity * f64::from(row.meal_quantity) / SERVING_BASE;
    }
    totals
        .into_iter()
        .map(|((name, unit), total_quantity)| IngredientTotal {
            name,
            unit,
            total_quantity,
        })
        .collect()
}

/// Shopping list for every meal the user has scheduled in `[start, end]`.
pub async fn ingredients_for_range(
    store: &dyn DietStore,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> StoreResult<Vec<IngredientTotal>> {
    let rows = store.ingredient_usage(user_id, start, end).await?;
    Ok(aggregate(rows))
}
