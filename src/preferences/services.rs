use time::OffsetDateTime;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::diet::model::{score, DietSubscription, NewSubscription, Order, OrderStatus};
use crate::error::AppError;
use crate::generator::services::{dispatch, should_generate};
use crate::preferences::dto::PreferencesRequest;
use crate::state::AppState;

#[derive(Debug)]
pub struct Submitted {
    pub subscription: DietSubscription,
    pub created: bool,
}

fn validate(req: &PreferencesRequest) -> Result<(), AppError> {
    if req.meal_count.is_some_and(|n| n < 1) {
        return Err(AppError::validation("mealCount must be positive"));
    }
    if req.age.is_some_and(|a| a < 0)
        || req.height.is_some_and(|h| h < 0)
        || req.weight.is_some_and(|w| w < 0.0 || !w.is_finite())
    {
        return Err(AppError::validation("age, weight and height must not be negative"));
    }
    if let Some(prefs) = &req.food_preferences {
        if let Some((dish, s)) = prefs
            .iter()
            .find(|(_, s)| !(score::AVOID..=score::PREFERRED).contains(*s))
        {
            return Err(AppError::validation(format!(
                "preference for '{dish}' must be 0, 1 or 2, got {s}"
            )));
        }
    }
    Ok(())
}

/// Overwrites the supplied fields of `sub`.
pub fn apply(sub: &mut DietSubscription, req: PreferencesRequest) {
    let flags = req.preferences;
    let r = &mut sub.restrictions;
    r.gluten_free = flags.gluten_free.unwrap_or(r.gluten_free);
    r.lactose_free = flags.lactose_free.unwrap_or(r.lactose_free);
    r.nut_free = flags.nut_free.unwrap_or(r.nut_free);
    r.fish_free = flags.fish_free.unwrap_or(r.fish_free);
    r.soy_free = flags.soy_free.unwrap_or(r.soy_free);

    if let Some(t) = req.diet_type {
        sub.diet_type = t;
    }
    if let Some(n) = req.meal_count {
        sub.meal_count = n;
    }
    if let Some(set) = req.preferences_set {
        sub.preferences_set = set;
    }
    if let Some(prefs) = req.food_preferences {
        sub.food_preferences = prefs;
    }

    let p = &mut sub.profile;
    if let Some(g) = req.gender {
        p.gender = g;
    }
    if let Some(a) = req.age {
        p.age = a;
    }
    if let Some(w) = req.weight {
        p.weight = w;
    }
    if let Some(h) = req.height {
        p.height = h;
    }
    if let Some(l) = req.activity_level {
        p.activity_level = l;
    }
}

/// Stores preferences on the subscription named by the order, or on the
/// user's subscription for the diet. With an order attached, the order
/// moves to `pending` and the AI diet is sent to the generator.
#[instrument(skip(st, req))]
pub async fn submit_preferences(
    st: &AppState,
    user_id: Uuid,
    req: PreferencesRequest,
) -> Result<Submitted, AppError> {
    let diet_id = req
        .diet_id
        .ok_or_else(|| AppError::validation("diet_id is required"))?;
    validate(&req)?;
    let diet = st
        .store
        .get_diet(diet_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("diet {diet_id} not found")))?;

    let order: Option<Order> = match req.order_id {
        Some(id) => st
            .store
            .get_order(id)
            .await?
            .filter(|o| o.user_id == user_id && o.subscription_id.is_some()),
        None => None,
    };

    let attached = match order.as_ref().and_then(|o| o.subscription_id) {
        Some(sub_id) => st.store.get_subscription(sub_id).await?,
        None => None,
    };
    let (mut sub, created) = match attached {
        Some(sub) => (sub, false),
        None => {
            st.store
                .find_or_create_subscription(NewSubscription {
                    user_id,
                    diet_id: diet.id,
                    starts_at: OffsetDateTime::now_utc(),
                    ends_at: None,
                    diet_type: req.diet_type.clone().unwrap_or_else(|| "standard".into()),
                    meal_count: req.meal_count.unwrap_or(3),
                })
                .await?
        }
    };

    apply(&mut sub, req);
    st.store.save_subscription(&sub).await?;
    info!(subscription_id = sub.id, created, preferences_set = sub.preferences_set, "preferences saved");

    if let Some(mut order) = order {
        if order.status == OrderStatus::New {
            st.store
                .set_order_status(order.id, OrderStatus::Pending)
                .await?;
            order.status = OrderStatus::Pending;
        }
        if order.status == OrderStatus::Pending
            && should_generate(&sub, st.config.generator.ai_diet_id)
        {
            dispatch(st, &order, &sub).await?;
        } else {
            debug!(order_id = order.id, status = %order.status, "no plan generation");
        }
    }

    Ok(Submitted {
        subscription: sub,
        created,
    })
}
