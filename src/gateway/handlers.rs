use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use super::GatewayState;
use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest},
        extractors::{AuthUser, JsonBody, PathParam},
    },
    error::AuthError,
};

#[instrument(skip_all)]
pub async fn register(
    State(state): State<GatewayState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let user = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<GatewayState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    Ok(Json(state.auth.login(payload).await?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<GatewayState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    Ok(Json(state.auth.get_user(user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<GatewayState>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AuthError> {
    Ok(Json(state.auth.update_user(user_id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<GatewayState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, AuthError> {
    state.auth.delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<GatewayState>,
    _caller: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<PublicUser>, AuthError> {
    Ok(Json(state.auth.get_user(id).await?))
}
