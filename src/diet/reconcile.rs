//! Merges a submitted day-by-day meal plan into stored days and meals.
//!
//! Each scheduled meal is keyed by its uuid. Entries carrying a uuid are
//! upserted, entries without one are inserted under a fresh uuid, and any
//! stored meal of the day whose uuid was not submitted is deleted. The
//! deletion set is computed against the meals present before the day was
//! touched, so meals inserted by the same call survive.
//!
//! A uuid already scheduled under another subscription rejects the whole
//! submission before anything is written.

use std::collections::HashSet;

use serde::Serialize;
use time::Date;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::diet::model::{DietMeal, MealType, MeasurementUnit};
use crate::store::{DietStore, StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq)]
pub struct MealSubmission {
    pub uuid: Option<Uuid>,
    pub meal_type: MealType,
    pub meal_id: i64,
    pub quantity: i32,
    pub unit: MeasurementUnit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DaySubmission {
    pub date: Date,
    pub meals: Vec<MealSubmission>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub days: usize,
    pub upserted: usize,
    pub inserted: usize,
    pub deleted: u64,
}

/// Uuids the client kept for a day. Entries without one are new meals.
pub fn submitted_ids(meals: &[MealSubmission]) -> HashSet<Uuid> {
    meals.iter().filter_map(|m| m.uuid).collect()
}

/// `persisted - submitted`, in the order the persisted ids were given.
pub fn stale_ids<I>(persisted: I, submitted: &HashSet<Uuid>) -> Vec<Uuid>
where
    I: IntoIterator<Item = Uuid>,
{
    persisted
        .into_iter()
        .filter(|id| !submitted.contains(id))
        .collect()
}

/// Applies `days` to the subscription in order.
///
/// A storage error stops the call; days already processed stay written.
pub async fn reconcile(
    store: &dyn DietStore,
    subscription_id: i64,
    days: &[DaySubmission],
) -> StoreResult<ReconcileReport> {
    let claimed: Vec<Uuid> = days.iter().flat_map(|d| submitted_ids(&d.meals)).collect();
    if let Some(foreign) = store
        .foreign_diet_meals(subscription_id, &claimed)
        .await?
        .first()
    {
        warn!(subscription_id, uuid = %foreign, "submitted meal belongs to another plan");
        return Err(StoreError::NotFound(format!("diet meal {foreign}")));
    }

    let mut report = ReconcileReport::default();

    for day in days {
        let diet_day = store.find_or_create_day(subscription_id, day.date).await?;
        let persisted: Vec<Uuid> = store
            .day_meals(diet_day.id)
            .await?
            .into_iter()
            .map(|m| m.entry.uuid)
            .collect();
        let keep = submitted_ids(&day.meals);

        for submitted in &day.meals {
            let meal = store.ensure_meal(submitted.meal_id).await?;
            let uuid = match submitted.uuid {
                Some(uuid) => {
                    report.upserted += 1;
                    uuid
                }
                None => {
                    report.inserted += 1;
                    Uuid::new_v4()
                }
            };
            store
                .upsert_diet_meal(&DietMeal {
                    uuid,
                    day_id: diet_day.id,
                    meal_id: meal.id,
                    meal_type: submitted.meal_type.clone(),
                    quantity: submitted.quantity,
                    unit: submitted.unit,
                })
                .await?;
        }

        let stale = stale_ids(persisted, &keep);
        let deleted = store.delete_diet_meals(diet_day.id, &stale).await?;
        debug!(
            subscription_id,
            date = %day.date,
            day_id = diet_day.id,
            meals = day.meals.len(),
            deleted,
            "diet day reconciled"
        );
        report.deleted += deleted;
        report.days += 1;
    }

    info!(subscription_id, ?report, "meal plan reconciled");
    Ok(report)
}
