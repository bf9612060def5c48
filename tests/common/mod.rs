#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;

use authgate::{
    auth::{CredentialService, JwtKeys},
    config::JwtConfig,
    users::InMemoryUserStore,
};

pub fn jwt_config(secret: &str) -> JwtConfig {
    JwtConfig {
        secret: secret.into(),
        issuer: "authgate-test".into(),
        audience: "authgate-test-users".into(),
        ttl_minutes: 5,
    }
}

pub fn credential_service(secret: &str) -> Arc<CredentialService> {
    Arc::new(CredentialService::new(
        Arc::new(InMemoryUserStore::new()),
        JwtKeys::new(&jwt_config(secret)),
    ))
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
