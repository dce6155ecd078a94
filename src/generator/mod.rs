use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod dishes;
pub mod dto;
pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::callback_routes())
}
