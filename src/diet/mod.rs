use crate::state::AppState;
use axum::Router;

pub mod calories;
mod dto;
pub mod handlers;
pub mod ingredients;
pub mod model;
pub mod reconcile;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::plan_routes())
}
