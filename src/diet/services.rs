use time::Date;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::diet::calories;
use crate::diet::dto::{
    BucketedDay, DayPayload, DietEditorResponse, DietPlanDetails, DietPlansResponse, EditorDay,
    MealBuckets, MealPayload, OrderInfo, PlannedMealView, SaveDietRequest,
};
use crate::diet::ingredients::{ingredients_for_range, IngredientTotal};
use crate::diet::model::{
    parse_iso_date, score, DietDay, MealType, MeasurementUnit, OrderStatus, PlannedMeal,
};
use crate::diet::reconcile::{reconcile, DaySubmission, MealSubmission, ReconcileReport};
use crate::error::AppError;
use crate::orders::services::owned_order;
use crate::state::AppState;

pub fn parse_date(raw: Option<&str>, field: &str) -> Result<Date, AppError> {
    let raw = raw.ok_or_else(|| AppError::validation(format!("{field} is required")))?;
    parse_iso_date(raw)
        .map_err(|_| AppError::validation(format!("{field} must be YYYY-MM-DD, got '{raw}'")))
}

pub fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<(Date, Date), AppError> {
    let start = parse_date(start, "startDate")?;
    let end = parse_date(end, "endDate")?;
    if start > end {
        return Err(AppError::validation("startDate must not be after endDate"));
    }
    Ok((start, end))
}

fn parse_meal(m: MealPayload) -> Result<MealSubmission, AppError> {
    let uuid = match m.uuid.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("invalid uuid '{raw}'")))?,
        ),
    };
    let meal_type = m
        .meal_type
        .ok_or_else(|| AppError::validation("meal_type is required"))?;
    let meal_id = m.id.ok_or_else(|| AppError::validation("meal id is required"))?;
    let unit = match m.unit.as_deref() {
        None => MeasurementUnit::Grams,
        Some(code) => code.parse().map_err(AppError::Validation)?,
    };
    Ok(MealSubmission {
        uuid,
        meal_type: MealType::from(meal_type),
        meal_id,
        quantity: m.grams.unwrap_or(0),
        unit,
    })
}

/// Turns the wire payload into reconciler input. Fails on the first bad field.
pub fn parse_days(days: Vec<DayPayload>) -> Result<Vec<DaySubmission>, AppError> {
    days.into_iter()
        .map(|d| {
            let date = parse_date(d.date.as_deref(), "date")?;
            let meals = d
                .meals
                .into_iter()
                .map(parse_meal)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DaySubmission { date, meals })
        })
        .collect()
}

/// Applies the editor's plan to the order's subscription.
///
/// The whole payload is parsed before anything is written.
#[instrument(skip(st, req))]
pub async fn save_diet_days(
    st: &AppState,
    user_id: Uuid,
    req: SaveDietRequest,
) -> Result<ReconcileReport, AppError> {
    let order_id = req
        .order_id
        .ok_or_else(|| AppError::validation("orderID is required"))?;
    let days = parse_days(
        req.diet_data
            .ok_or_else(|| AppError::validation("diet_data is required"))?,
    )?;
    let status = req
        .status
        .as_deref()
        .map(|s| s.parse::<OrderStatus>())
        .transpose()
        .map_err(AppError::Validation)?;

    let order = owned_order(st, user_id, order_id).await?;
    let subscription_id = order
        .subscription_id
        .ok_or_else(|| AppError::not_found(format!("subscription of order {order_id}")))?;

    if let Some(next) = status {
        if !order.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "order {} cannot move from {} to {}",
                order.id, order.status, next
            )));
        }
    }

    let _guard = st.locks.acquire(subscription_id).await;
    let report = reconcile(st.store.as_ref(), subscription_id, &days).await?;
    if let Some(next) = status.filter(|s| *s != order.status) {
        st.store.set_order_status(order.id, next).await?;
    }
    info!(order_id, subscription_id, days = report.days, "diet days saved");
    Ok(report)
}

pub async fn ingredients(
    st: &AppState,
    user_id: Uuid,
    start: &str,
    end: &str,
) -> Result<Vec<IngredientTotal>, AppError> {
    let (start, end) = parse_range(Some(start), Some(end))?;
    Ok(ingredients_for_range(st.store.as_ref(), user_id, start, end).await?)
}

async fn days_with_meals(
    st: &AppState,
    subscription_id: i64,
    start: Date,
    end: Date,
) -> Result<Vec<(DietDay, Vec<PlannedMeal>)>, AppError> {
    let days = st.store.days_in_range(subscription_id, start, end).await?;
    let mut out = Vec::with_capacity(days.len());
    for day in days {
        let meals = st.store.day_meals(day.id).await?;
        out.push((day, meals));
    }
    Ok(out)
}

/// Splits a day's meals into the five known slots. Other slots are dropped.
pub fn bucket(meals: Vec<PlannedMeal>) -> MealBuckets {
    let mut b = MealBuckets::default();
    for p in meals {
        let slot = match p.entry.meal_type {
            MealType::Breakfast => &mut b.breakfast,
            MealType::Lunch => &mut b.lunch,
            MealType::Dinner => &mut b.dinner,
            MealType::AfternoonSnack => &mut b.afternoon_snack,
            MealType::EveningSnack => &mut b.evening_snack,
            MealType::Other(_) => continue,
        };
        slot.push(PlannedMealView::from_planned(p, false));
    }
    b
}

/// Latest order and subscription of the user with the days in range.
#[instrument(skip(st))]
pub async fn plans_overview(
    st: &AppState,
    user_id: Uuid,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<DietPlansResponse, AppError> {
    let (start, end) = parse_range(start, end)?;
    let order = st
        .store
        .latest_order_for_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("no order for user"))?;
    let sub = st
        .store
        .latest_subscription_for_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("no diet subscription for user"))?;

    let days = days_with_meals(st, sub.id, start, end)
        .await?
        .into_iter()
        .map(|(day, meals)| BucketedDay {
            date: day.date,
            meals: bucket(meals),
        })
        .collect();

    Ok(DietPlansResponse {
        preferences_set: sub.preferences_set,
        order_info: OrderInfo {
            id: order.id,
            start_date: order.starts_at,
            end_date: order.ends_at,
            status: order.status,
            dieta: order.diet_id,
        },
        days,
    })
}

/// Plan details of one order plus a flat, editable meal list per day.
#[instrument(skip(st))]
pub async fn editor_view(
    st: &AppState,
    user_id: Uuid,
    order_id: Option<i64>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<DietEditorResponse, AppError> {
    let order_id = order_id.ok_or_else(|| AppError::validation("orderID is required"))?;
    let (start, end) = parse_range(start, end)?;
    let order = owned_order(st, user_id, order_id).await?;
    let sub_id = order
        .subscription_id
        .ok_or_else(|| AppError::not_found(format!("subscription of order {order_id}")))?;
    let sub = st
        .store
        .get_subscription(sub_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("subscription {sub_id}")))?;

    let days = days_with_meals(st, sub.id, start, end)
        .await?
        .into_iter()
        .map(|(day, meals)| EditorDay {
            date: day.date,
            meals: meals
                .into_iter()
                .map(|p| PlannedMealView::from_planned(p, true))
                .collect(),
        })
        .collect();

    Ok(DietEditorResponse {
        diet_plan: DietPlanDetails {
            user_id: sub.user_id,
            diet_id: sub.id,
            diet_type: sub.diet_type.clone(),
            diet_start_date: sub.starts_at,
            diet_end_date: sub.ends_at,
            gluten_free: sub.restrictions.gluten_free,
            lactose_free: sub.restrictions.lactose_free,
            nut_free: sub.restrictions.nut_free,
            fish_free: sub.restrictions.fish_free,
            soy_free: sub.restrictions.soy_free,
            food_preferences_1: sub.dishes_scored(score::PREFERRED),
            food_preferences_2: sub.dishes_scored(score::AVOID),
            status: order.status,
            calories: calories::estimate_for(&sub.profile),
        },
        days,
    })
}
