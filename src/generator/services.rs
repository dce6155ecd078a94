use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::diet::calories;
use crate::diet::model::{
    parse_iso_date, DietMeal, DietSubscription, MealType, MeasurementUnit, Order, OrderStatus,
};
use crate::error::AppError;
use crate::generator::dishes::DishCatalog;
use crate::generator::dto::{CallbackReport, GeneratedDay, GenerationRequest, PlanCallback};
use crate::state::AppState;

/// Generated portions are multiples of a 100 g serving.
pub const PORTION_GRAMS: f64 = 100.0;

/// Generation runs only for finalized preferences on the AI template.
pub fn should_generate(sub: &DietSubscription, ai_diet_id: i64) -> bool {
    sub.preferences_set && sub.diet_id == ai_diet_id
}

pub fn build_request(
    sub: &DietSubscription,
    duration: i32,
    dishes: &DishCatalog,
    callback_url: &str,
) -> GenerationRequest {
    GenerationRequest {
        user: sub.user_id,
        name: sub.diet_type.clone(),
        user_diet: sub.id,
        duration,
        meals_per_day: sub.meal_count,
        not_preferred_ingredients: dishes.not_preferred_ingredients(&sub.food_preferences),
        allergens_to_avoid: sub
            .restrictions
            .allergens()
            .into_iter()
            .map(|a| a.domain_name().to_string())
            .collect(),
        max_calories: calories::estimate_for(&sub.profile),
        user_weight: sub.profile.weight,
        callback_url: callback_url.to_string(),
    }
}

pub fn portions_to_grams(portions: f64) -> i32 {
    (portions * PORTION_GRAMS).round() as i32
}

/// Sends the generation request for `order`. On success the order moves to
/// `aipending`; on failure it is left as it was and the error is returned.
#[instrument(skip(st, order, sub), fields(order_id = order.id, subscription_id = sub.id))]
pub async fn dispatch(st: &AppState, order: &Order, sub: &DietSubscription) -> Result<(), AppError> {
    let req = build_request(
        sub,
        order.duration,
        &st.dishes,
        &st.config.generator.callback_url,
    );
    st.generator.request_plan(&req).await?;

    if order.status.can_transition_to(OrderStatus::AiPending) {
        st.store
            .set_order_status(order.id, OrderStatus::AiPending)
            .await?;
    }
    info!(max_calories = req.max_calories, "plan generation requested");
    Ok(())
}

struct ValidCallback {
    user_id: Uuid,
    subscription_id: i64,
    days: Vec<(Date, GeneratedDay)>,
}

fn validate(payload: PlanCallback) -> Result<ValidCallback, AppError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::validation("user_id is required"))?;
    let subscription_id = payload
        .user_diet
        .ok_or_else(|| AppError::validation("user_diet is required"))?;
    let plan = payload
        .diet_plan
        .ok_or_else(|| AppError::validation("diet_plan is required"))?;

    let mut days = Vec::with_capacity(plan.len());
    for day in plan {
        let date = parse_iso_date(&day.date)
            .map_err(|_| AppError::validation(format!("invalid date '{}'", day.date)))?;
        days.push((date, day));
    }
    Ok(ValidCallback {
        user_id,
        subscription_id,
        days,
    })
}

/// Writes a generated plan into the subscription and completes its order.
///
/// Everything is validated before the first write. Days are found or
/// created; meals are always appended, so a repeated callback duplicates
/// the plan's meals.
#[instrument(skip(st, payload))]
pub async fn apply_callback(st: &AppState, payload: PlanCallback) -> Result<CallbackReport, AppError> {
    let cb = validate(payload)?;

    let sub = st
        .store
        .get_subscription(cb.subscription_id)
        .await?
        .filter(|s| s.user_id == cb.user_id)
        .ok_or_else(|| AppError::not_found(format!("subscription {} not found", cb.subscription_id)))?;

    let _guard = st.locks.acquire(sub.id).await;
    let mut report = CallbackReport::default();

    for (date, day) in &cb.days {
        let diet_day = st.store.find_or_create_day(sub.id, *date).await?;
        for generated in &day.meals {
            let Some(meal) = st.store.find_meal_by_name(&generated.name).await? else {
                warn!(name = %generated.name, %date, subscription_id = sub.id, "generated meal not in catalog; skipped");
                report.meals_skipped += 1;
                continue;
            };
            st.store
                .upsert_diet_meal(&DietMeal {
                    uuid: Uuid::new_v4(),
                    day_id: diet_day.id,
                    meal_id: meal.id,
                    meal_type: MealType::from(generated.meal_type.as_str()),
                    quantity: portions_to_grams(generated.portions),
                    unit: MeasurementUnit::Grams,
                })
                .await?;
            report.meals_created += 1;
        }
        report.days += 1;
    }

    match st.store.order_for_subscription(sub.id).await? {
        Some(order) if order.status.can_transition_to(OrderStatus::Completed) => {
            st.store
                .set_order_status(order.id, OrderStatus::Completed)
                .await?;
        }
        Some(order) => {
            warn!(order_id = order.id, status = %order.status, "order cannot complete from its status")
        }
        None => warn!(subscription_id = sub.id, "generated plan has no order"),
    }

    info!(
        subscription_id = sub.id,
        days = report.days,
        created = report.meals_created,
        skipped = report.meals_skipped,
        "generated plan applied"
    );
    report.message = "Plan received and processed".into();
    Ok(report)
}
