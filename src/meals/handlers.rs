use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

use super::dto::{MealDetails, MealSearchItem, SearchQuery};

pub const SEARCH_LIMIT: i64 = 10;

// Catalog reads are public.
pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/:id", get(get_meal))
        .route("/search-meals", get(search_meals))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MealDetails>, AppError> {
    let meal = state
        .store
        .get_meal(id)
        .await?
        .ok_or_else(|| AppError::not_found("Meal not found"))?;
    Ok(Json(meal.into()))
}

#[instrument(skip(state))]
pub async fn search_meals(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<MealSearchItem>>, AppError> {
    let meals = state.store.search_meals(q.query.trim(), SEARCH_LIMIT).await?;
    Ok(Json(meals.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet::model::Meal;
    use crate::generator::client::FakeGenerator;
    use crate::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> Router {
        let store = Arc::new(MemoryStore::new());
        for i in 1..=12 {
            store
                .add_meal(Meal {
                    id: i,
                    name: format!("Sałatka {i}"),
                    calories: 300,
                    gluten: i == 1,
                    ..Meal::default()
                })
                .await;
        }
        store
            .add_meal(Meal {
                id: 20,
                name: "Owsianka".into(),
                ..Meal::default()
            })
            .await;
        let st = AppState::with_backends(store, Arc::new(FakeGenerator::default()));
        read_routes().with_state(st)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let res = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn meal_details_or_404() {
        let (status, body) = get_json(app().await, "/meals/20").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Owsianka");

        let (status, body) = get_json(app().await, "/meals/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Meal not found");
    }

    #[tokio::test]
    async fn search_is_capped_and_flattened() {
        let (status, body) = get_json(app().await, "/search-meals?query=sa%C5%82atka").await;
        assert_eq!(status, StatusCode::OK);
        let hits = body.as_array().unwrap();
        assert_eq!(hits.len(), SEARCH_LIMIT as usize);
        assert_eq!(hits[0]["grams"], 100);
        assert_eq!(hits[0]["calories"], 300);
        assert_eq!(hits[0]["gluten_free"], true);
    }
}
