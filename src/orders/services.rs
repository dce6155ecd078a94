use time::{Duration, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::diet::model::{Order, OrderStatus};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::NewOrder;

/// Billing month length used for order ranges and pre-created days.
pub const DAYS_PER_MONTH: i64 = 30;

/// Order `order_id` if it belongs to `user_id`. Someone else's order is
/// reported as missing.
pub async fn owned_order(st: &AppState, user_id: Uuid, order_id: i64) -> Result<Order, AppError> {
    st.store
        .get_order(order_id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or_else(|| AppError::not_found(format!("order {order_id} not found")))
}

/// Places an order and opens its subscription. Manually planned diets get
/// one empty day per ordered day; the AI diet is filled by the generator.
#[instrument(skip(st))]
pub async fn create_order(
    st: &AppState,
    user_id: Uuid,
    diet_id: Option<i64>,
    duration: Option<i32>,
) -> Result<Order, AppError> {
    let diet_id = diet_id.ok_or_else(|| AppError::validation("dieta_id is required"))?;
    let duration = duration.ok_or_else(|| AppError::validation("duration is required"))?;
    if duration < 1 {
        return Err(AppError::validation("duration must be at least one month"));
    }
    let diet = st
        .store
        .get_diet(diet_id)
        .await?
        .ok_or_else(|| AppError::validation(format!("diet {diet_id} does not exist")))?;

    let total_days = DAYS_PER_MONTH * i64::from(duration);
    let starts_at = OffsetDateTime::now_utc();
    let ends_at = starts_at + Duration::days(total_days);

    let (order, sub) = st
        .store
        .create_order(NewOrder {
            user_id,
            diet_id: diet.id,
            duration,
            starts_at,
            ends_at,
            status: OrderStatus::New,
        })
        .await?;

    if diet.id != st.config.generator.ai_diet_id {
        let first = starts_at.date();
        let dates: Vec<_> = (0..total_days).map(|d| first + Duration::days(d)).collect();
        st.store.create_days(sub.id, &dates).await?;
    }

    info!(order_id = order.id, subscription_id = sub.id, diet = %diet.name, duration, "order created");
    Ok(order)
}
