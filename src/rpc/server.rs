use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest,
            ValidateRequest, ValidateResponse,
        },
        extractors::{JsonBody, PathParam},
        services::CredentialService,
    },
    error::AuthError,
    telemetry::http_trace_layer,
};

type Credentials = State<Arc<CredentialService>>;

/// Internal RPC surface of the auth service. Not meant to be exposed publicly.
pub fn router(service: Arc<CredentialService>) -> Router {
    Router::new()
        .route("/rpc/register", post(register))
        .route("/rpc/login", post(login))
        .route("/rpc/validate", post(validate))
        .route(
            "/rpc/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/health", get(|| async { "ok" }))
        .with_state(service)
        .layer(http_trace_layer())
}

async fn register(
    State(svc): Credentials,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let user = svc.register(&req.name, &req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(svc): Credentials,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    Ok(Json(svc.login(&req.email, &req.password).await?))
}

async fn validate(
    State(svc): Credentials,
    JsonBody(req): JsonBody<ValidateRequest>,
) -> Result<Json<ValidateResponse>, AuthError> {
    Ok(Json(svc.validate(&req.token)?))
}

async fn get_user(
    State(svc): Credentials,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<PublicUser>, AuthError> {
    Ok(Json(svc.get_user(id).await?))
}

async fn update_user(
    State(svc): Credentials,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AuthError> {
    Ok(Json(svc.update_user(id, req).await?))
}

async fn delete_user(
    State(svc): Credentials,
    PathParam(id): PathParam<Uuid>,
) -> Result<StatusCode, AuthError> {
    svc.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
