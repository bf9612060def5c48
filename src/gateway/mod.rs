//! Public HTTP front door. Identity operations are delegated to the auth
//! service through [`AuthRpc`]; protected routes sit behind
//! [`middleware::require_bearer`].

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::{rpc::AuthRpc, telemetry::http_trace_layer};

pub mod handlers;
pub mod middleware;

pub use middleware::{LocalVerifier, RemoteVerifier, TokenVerifier};

#[derive(Clone)]
pub struct GatewayState {
    pub auth: Arc<dyn AuthRpc>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl GatewayState {
    pub fn new(auth: Arc<dyn AuthRpc>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { auth, verifier }
    }
}

pub fn router(state: GatewayState) -> Router {
    let protected = Router::new()
        .route(
            "/me",
            get(handlers::get_me)
                .put(handlers::update_me)
                .delete(handlers::delete_me),
        )
        .route("/users/:id", get(handlers::get_user))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_bearer));

    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/health", get(|| async { "ok" }))
        .merge(protected)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(http_trace_layer())
}
