use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::auth::services::AuthUser;
use crate::error::AppError;
use crate::measurements::dto::MeasurementRequest;
use crate::measurements::repo_types::BodyMeasurement;
use crate::measurements::services;
use crate::state::AppState;

pub fn measurement_routes() -> Router<AppState> {
    Router::new()
        .route("/measurements", get(list).post(create))
        .route(
            "/measurements/:id",
            get(fetch).put(update).delete(remove),
        )
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<BodyMeasurement>>, AppError> {
    Ok(Json(BodyMeasurement::list_for_user(&state.db, user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<MeasurementRequest>,
) -> Result<(StatusCode, Json<BodyMeasurement>), AppError> {
    let m = services::create(&state, user_id, body).await?;
    Ok((StatusCode::CREATED, Json(m)))
}

#[instrument(skip(state))]
pub async fn fetch(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<BodyMeasurement>, AppError> {
    BodyMeasurement::find_owned(&state.db, user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("measurement {id} not found")))
}

#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<MeasurementRequest>,
) -> Result<Json<BodyMeasurement>, AppError> {
    Ok(Json(services::update(&state, user_id, id, body).await?))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    match BodyMeasurement::delete_owned(&state.db, user_id, id).await? {
        0 => Err(AppError::not_found(format!("measurement {id} not found"))),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}
