mod app;
mod auth;
mod config;
mod diet;
mod error;
mod generator;
mod meals;
mod measurements;
mod orders;
mod preferences;
mod state;
mod store;
mod training;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "fitter=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;
    sqlx::migrate!("./migrations").run(&state.db).await?;
    tracing::info!(ai_diet_id = state.config.generator.ai_diet_id, "state ready");

    app::serve(app::build_app(state)).await
}
