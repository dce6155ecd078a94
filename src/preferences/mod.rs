use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::preference_routes())
}
