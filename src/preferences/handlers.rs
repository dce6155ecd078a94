use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use crate::auth::services::AuthUser;
use crate::diet::model::DietSubscription;
use crate::error::AppError;
use crate::preferences::dto::PreferencesRequest;
use crate::preferences::services::{submit_preferences, Submitted};
use crate::state::AppState;

pub fn preference_routes() -> Router<AppState> {
    Router::new().route("/diet-preferences", post(diet_preferences))
}

#[instrument(skip(state, body))]
pub async fn diet_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<PreferencesRequest>,
) -> Result<(StatusCode, Json<DietSubscription>), AppError> {
    let Submitted {
        subscription,
        created,
    } = submit_preferences(&state, user_id, body).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(subscription)))
}
