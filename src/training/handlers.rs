use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::auth::services::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::training::dto::{
    CatalogQuery, ExerciseInput, ExerciseView, NewTrainingRequest, TrainingView, UserProgress,
};
use crate::training::repo_types::CatalogExercise;
use crate::training::services;

// The exercise catalog is public, like the meal catalog.
pub fn catalog_routes() -> Router<AppState> {
    Router::new().route("/exercises", get(search_exercises))
}

pub fn training_routes() -> Router<AppState> {
    Router::new()
        .route("/training-start", post(start_training))
        .route("/training-sessions", post(create_training))
        .route("/training-sessions/:id/exercises", post(add_exercise))
        .route("/trainings", get(list_trainings))
        .route("/user-progress", get(user_progress))
}

#[instrument(skip(state))]
pub async fn start_training(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(StatusCode, Json<TrainingView>), AppError> {
    let t = services::start_session(&state, user_id).await?;
    Ok((StatusCode::CREATED, Json(t)))
}

#[instrument(skip(state, body))]
pub async fn create_training(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<NewTrainingRequest>,
) -> Result<(StatusCode, Json<TrainingView>), AppError> {
    let t = services::create_session(&state, user_id, body).await?;
    Ok((StatusCode::CREATED, Json(t)))
}

#[instrument(skip(state, body))]
pub async fn add_exercise(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<ExerciseInput>,
) -> Result<(StatusCode, Json<ExerciseView>), AppError> {
    let ex = services::add_exercise(&state, user_id, id, body).await?;
    Ok((StatusCode::CREATED, Json(ex)))
}

#[instrument(skip(state))]
pub async fn list_trainings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TrainingView>>, AppError> {
    Ok(Json(services::list_sessions(&state, user_id).await?))
}

#[instrument(skip(state))]
pub async fn user_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProgress>, AppError> {
    let today = OffsetDateTime::now_utc().date();
    Ok(Json(services::progress(&state, user_id, today).await?))
}

#[instrument(skip(state))]
pub async fn search_exercises(
    State(state): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<Vec<CatalogExercise>>, AppError> {
    Ok(Json(services::search_catalog(&state, &q.search).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn missing_search_means_everything() {
        let q: CatalogQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.search, "");
        assert_eq!(services::contains_pattern(&q.search), "%%");
    }

    #[test]
    fn catalog_rows_serialize_flat() {
        let row = CatalogExercise {
            id: 3,
            name: "Martwy ciąg".into(),
            description: String::new(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["name"], "Martwy ciąg");
        assert_eq!(json["description"], "");
    }

    #[tokio::test]
    async fn session_routes_need_a_token() {
        let app = training_routes().with_state(AppState::fake());
        let res = app
            .oneshot(Request::get("/trainings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
