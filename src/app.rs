use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, diet, generator, meals, measurements, orders, preferences, training};

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(meals::router())
        .merge(orders::router())
        .merge(preferences::router())
        .merge(diet::router())
        .merge(generator::router())
        .merge(training::router())
        .merge(measurements::router())
        .route("/health", get(|| async { "ok" }));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri(),
                        status = tracing::field::Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, ms, "response");
                        } else {
                            tracing::info!(%status, ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services::JwtKeys;
    use crate::diet::model::{Meal, MeasurementUnit, OrderStatus};
    use crate::generator::client::FakeGenerator;
    use crate::store::{DietStore, MemoryStore, NewOrder};
    use axum::body::{to_bytes, Body};
    use axum::extract::FromRef;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use time::{macros::datetime, Duration};
    use tower::ServiceExt;
    use uuid::Uuid;

    struct Harness {
        app: Router,
        store: Arc<MemoryStore>,
        user: Uuid,
        token: String,
        order_id: i64,
        subscription_id: i64,
    }

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        store.add_diet(2, "Keto").await;
        store
            .add_meal(Meal {
                id: 3,
                name: "Jajecznica".into(),
                ..Meal::default()
            })
            .await;
        store
            .add_meal_ingredient(3, "jajka", MeasurementUnit::Grams, 10.0)
            .await;

        let user = Uuid::new_v4();
        let starts_at = datetime!(2024-02-01 0:00 UTC);
        let (order, sub) = store
            .create_order(NewOrder {
                user_id: user,
                diet_id: 2,
                duration: 1,
                starts_at,
                ends_at: starts_at + Duration::days(30),
                status: OrderStatus::Pending,
            })
            .await
            .unwrap();

        let state = AppState::with_backends(store.clone(), Arc::new(FakeGenerator::default()));
        let token = JwtKeys::from_ref(&state).sign_access(user).unwrap();
        Harness {
            app: build_app(state),
            store,
            user,
            token,
            order_id: order.id,
            subscription_id: sub.id,
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut req = Request::post(uri).header("content-type", "application/json");
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {t}"));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let h = harness().await;
        let res = h
            .app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn diet_routes_need_a_token() {
        let h = harness().await;
        let (status, body) = send(
            &h.app,
            Request::get("/api/v1/diet-ingredients/2024-02-01/2024-02-07")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn saved_plan_shows_up_in_ingredient_totals() {
        let h = harness().await;
        let (status, body) = send(
            &h.app,
            post_json(
                "/api/v1/save-diet-data",
                Some(&h.token),
                json!({
                    "orderID": h.order_id,
                    "diet_data": [{
                        "date": "2024-02-05",
                        "meals": [{ "uuid": "", "meal_type": "breakfast", "id": 3, "grams": 200 }]
                    }]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Diet days saved successfully.");

        let (status, body) = send(
            &h.app,
            Request::get("/api/v1/diet-ingredients/2024-02-01/2024-02-07")
                .header("authorization", format!("Bearer {}", h.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let row = &body["ingredients"][0];
        assert_eq!(row["ingredient__name"], "jajka");
        assert_eq!(row["total_quantity"], 20.0);
        assert_eq!(row["ingredient__measurement_unit"], "g");
    }

    #[tokio::test]
    async fn save_rejects_other_users_order() {
        let h = harness().await;
        let stranger = JwtKeys::from_ref(&AppState::fake())
            .sign_access(Uuid::new_v4())
            .unwrap();
        let (status, _) = send(
            &h.app,
            post_json(
                "/api/v1/save-diet-data",
                Some(&stranger),
                json!({ "orderID": h.order_id, "diet_data": [] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn save_cannot_take_over_another_users_meal() {
        let h = harness().await;
        let meal_uuid = Uuid::new_v4();
        let day = |uuid: Uuid, order_id: i64| {
            json!({
                "orderID": order_id,
                "diet_data": [{
                    "date": "2024-02-05",
                    "meals": [{ "uuid": uuid, "meal_type": "lunch", "id": 3, "grams": 120 }]
                }]
            })
        };
        let (status, _) = send(
            &h.app,
            post_json("/api/v1/save-diet-data", Some(&h.token), day(meal_uuid, h.order_id)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let other = Uuid::new_v4();
        let starts_at = datetime!(2024-02-01 0:00 UTC);
        let (other_order, _) = h
            .store
            .create_order(NewOrder {
                user_id: other,
                diet_id: 2,
                duration: 1,
                starts_at,
                ends_at: starts_at + Duration::days(30),
                status: OrderStatus::Pending,
            })
            .await
            .unwrap();
        let other_token = JwtKeys::from_ref(&AppState::fake()).sign_access(other).unwrap();

        let mut takeover = day(meal_uuid, other_order.id);
        takeover["status"] = json!("completed");
        let (status, _) = send(
            &h.app,
            post_json("/api/v1/save-diet-data", Some(&other_token), takeover),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let untouched = h.store.get_order(other_order.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, OrderStatus::Pending);

        let meals = h.store.all_diet_meals().await;
        assert_eq!(meals.len(), 1);
        let own_days = h.store.all_days(h.subscription_id).await;
        assert!(own_days.iter().any(|d| d.id == meals[0].day_id));
        assert_eq!(meals[0].quantity, 120);
    }

    #[tokio::test]
    async fn generator_callback_is_unauthenticated() {
        let h = harness().await;
        let (status, body) = send(
            &h.app,
            post_json(
                "/api/v1/generator/callback",
                None,
                json!({
                    "user_id": h.user,
                    "user_diet": h.subscription_id,
                    "diet_plan": [{
                        "date": "2024-02-02",
                        "total_calories": 1800.0,
                        "meals": [{ "meal_name": "Jajecznica", "meal_type": "breakfast", "portions": 1.5 }]
                    }]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Plan received and processed");
        let meals = h.store.all_diet_meals().await;
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].quantity, 150);
    }

    #[tokio::test]
    async fn generator_callback_errors() {
        let h = harness().await;
        let writes = h.store.write_count().await;
        let (status, _) = send(
            &h.app,
            post_json(
                "/api/v1/generator/callback",
                None,
                json!({ "user_id": h.user, "user_diet": 9999, "diet_plan": [] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &h.app,
            post_json(
                "/api/v1/generator/callback",
                None,
                json!({ "user_id": h.user, "user_diet": h.subscription_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "diet_plan is required");
        assert_eq!(h.store.write_count().await, writes);
    }
}
