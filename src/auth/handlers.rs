use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, Credentials, PublicUser, RefreshRequest},
        repo_types::User,
        services::{
            hash_password, is_valid_email, normalize_email, verify_password, AuthUser, JwtKeys,
            MIN_PASSWORD_LEN,
        },
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn token_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let (access_token, refresh_token) = JwtKeys::from_ref(state).sign_pair(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password too short"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &email, &hash)
        .await?
        .ok_or_else(|| AppError::Conflict("Email already registered".into()))?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(token_response(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::unauthorized("Invalid credentials"));
    };
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(token_response(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::unauthorized(e.to_string()))?;
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;
    Ok(Json(token_response(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;
    Ok(Json(user.into()))
}
