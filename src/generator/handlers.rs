use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::error::AppError;
use crate::generator::dto::{CallbackReport, PlanCallback};
use crate::generator::services::apply_callback;
use crate::state::AppState;

pub fn callback_routes() -> Router<AppState> {
    Router::new().route("/generator/callback", post(plan_callback))
}

/// Called by the generator once a plan is ready. Not behind `AuthUser`.
#[instrument(skip(state, payload))]
pub async fn plan_callback(
    State(state): State<AppState>,
    Json(payload): Json<PlanCallback>,
) -> Result<Json<CallbackReport>, AppError> {
    Ok(Json(apply_callback(&state, payload).await?))
}
