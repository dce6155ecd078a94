use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use crate::auth::services::AuthUser;
use crate::diet::model::Order;
use crate::error::AppError;
use crate::orders::dto::{CreateOrderRequest, CreateOrderResponse};
use crate::orders::services;
use crate::state::AppState;

pub fn order_routes() -> Router<AppState> {
    Router::new().route("/orders", post(create_order).get(list_orders))
}

#[instrument(skip(state, body))]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    let order = services::create_order(&state, user_id, body.dieta_id, body.duration).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "Order created successfully.",
            zamowienie_id: order.id,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.store.list_orders_for_user(user_id).await?))
}
