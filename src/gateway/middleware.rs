use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use uuid::Uuid;

use super::GatewayState;
use crate::{
    auth::{extractors::AuthUser, jwt::JwtKeys},
    error::AuthError,
    rpc::AuthRpc,
};

/// Turns a bearer token into the id of the user it was issued to.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Uuid, AuthError>;
}

/// Asks the auth service on every request.
pub struct RemoteVerifier {
    auth: Arc<dyn AuthRpc>,
}

impl RemoteVerifier {
    pub fn new(auth: Arc<dyn AuthRpc>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl TokenVerifier for RemoteVerifier {
    async fn authenticate(&self, token: &str) -> Result<Uuid, AuthError> {
        let res = self.auth.validate(token).await?;
        if !res.valid {
            return Err(AuthError::Unauthorized);
        }
        Ok(res.subject)
    }
}

/// Checks signature, issuer, audience and expiry in-process with the shared secret.
/// Rejects exactly what the auth service's `validate` rejects.
pub struct LocalVerifier {
    keys: JwtKeys,
}

impl LocalVerifier {
    pub fn new(keys: JwtKeys) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl TokenVerifier for LocalVerifier {
    async fn authenticate(&self, token: &str) -> Result<Uuid, AuthError> {
        self.keys
            .verify(token)
            .map(|claims| claims.sub)
            .map_err(|_| AuthError::Unauthorized)
    }
}

/// Reads `Authorization: Bearer <token>`. `None` when absent, not UTF-8,
/// another scheme, or empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Gate for protected routes. Any failure answers 401; an unreachable auth
/// service is logged as an error, a bad token as a warning.
pub async fn require_bearer(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        warn!("missing or malformed bearer token");
        return AuthError::Unauthorized.into_response();
    };

    match state.verifier.authenticate(&token).await {
        Ok(subject) => {
            request.extensions_mut().insert(AuthUser(subject));
            next.run(request).await
        }
        Err(AuthError::Unavailable(reason)) => {
            error!(%reason, "auth service unavailable, rejecting request");
            AuthError::Unauthorized.into_response()
        }
        Err(e) => {
            warn!(error = %e, "bearer token rejected");
            AuthError::Unauthorized.into_response()
        }
    }
}
