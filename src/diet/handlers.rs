use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::services::AuthUser;
use crate::diet::dto::{
    DietEditorResponse, DietPlansResponse, EditorQuery, IngredientsResponse, MessageResponse,
    RangeQuery, SaveDietRequest,
};
use crate::diet::services;
use crate::error::AppError;
use crate::state::AppState;

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/save-diet-data", post(save_diet_data))
        .route("/diet-plans", get(diet_plans))
        .route("/diet-editor", get(diet_editor))
        .route("/diet-ingredients/:start_date/:end_date", get(diet_ingredients))
}

#[instrument(skip(state, body))]
pub async fn save_diet_data(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SaveDietRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    services::save_diet_days(&state, user_id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Diet days saved successfully.",
        }),
    ))
}

#[instrument(skip(state))]
pub async fn diet_ingredients(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((start_date, end_date)): Path<(String, String)>,
) -> Result<Json<IngredientsResponse>, AppError> {
    let totals = services::ingredients(&state, user_id, &start_date, &end_date).await?;
    Ok(Json(IngredientsResponse {
        ingredients: totals.into_iter().map(Into::into).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn diet_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<RangeQuery>,
) -> Result<Json<DietPlansResponse>, AppError> {
    let view = services::plans_overview(
        &state,
        user_id,
        q.start_date.as_deref(),
        q.end_date.as_deref(),
    )
    .await?;
    Ok(Json(view))
}

#[instrument(skip(state))]
pub async fn diet_editor(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<EditorQuery>,
) -> Result<Json<DietEditorResponse>, AppError> {
    let view = services::editor_view(
        &state,
        user_id,
        q.order_id,
        q.start_date.as_deref(),
        q.end_date.as_deref(),
    )
    .await?;
    Ok(Json(view))
}
