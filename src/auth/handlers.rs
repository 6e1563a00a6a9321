use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
    auth::dto::{
        ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
        RoleUpdateRequest,
    },
    error::ApiError,
    state::AppState,
    store::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

pub fn user_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", delete(delete_user))
        .route("/users/:id/role", put(update_role))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.auth.register(payload).await?))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .auth
        .login(&payload.email, &payload.password, &payload.role)
        .await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    state.auth.forgot_password(&payload.email).await?;
    Ok(Json(json!({ "message": "OTP sent to email" })))
}

#[instrument(skip(state, payload))]
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .auth
        .reset_password(&payload.email, &payload.otp, &payload.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password updated successfully" })))
}

#[instrument(skip(state))]
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.auth.list_users().await?))
}

#[instrument(skip(state))]
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.auth.delete_user(&id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

#[instrument(skip(state, payload))]
async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RoleUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    state.auth.update_role(&id, payload.role).await?;
    Ok(Json(json!({ "message": "Role updated successfully" })))
}
