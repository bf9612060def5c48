mod common;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{body::Body, http::Request, http::StatusCode, Router};
use jsonwebtoken::{encode, Header};
use serde_json::json;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use authgate::{
    auth::{jwt::Claims, JwtKeys},
    error::AuthError,
    gateway::{self, GatewayState, LocalVerifier, RemoteVerifier, TokenVerifier},
    rpc::{AuthClient, AuthRpc},
};
use common::{bearer_request, body_json, credential_service, json_request, jwt_config};

const SECRET: &str = "gateway-secret";

fn remote_gateway() -> Router {
    let auth: Arc<dyn AuthRpc> = credential_service(SECRET);
    let verifier = Arc::new(RemoteVerifier::new(Arc::clone(&auth)));
    gateway::router(GatewayState::new(auth, verifier))
}

fn local_gateway() -> Router {
    let auth: Arc<dyn AuthRpc> = credential_service(SECRET);
    let verifier = Arc::new(LocalVerifier::new(JwtKeys::new(&jwt_config(SECRET))));
    gateway::router(GatewayState::new(auth, verifier))
}

async fn register_and_login(app: &Router, email: &str) -> (Uuid, String) {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({"name": "Ann", "email": email, "password": "pw123456"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let id: Uuid = body_json(res).await["id"].as_str().unwrap().parse().unwrap();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({"email": email, "password": "pw123456"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let token = body_json(res).await["token"].as_str().unwrap().to_string();
    (id, token)
}

fn expired_token(secret: &str, subject: Uuid) -> String {
    let keys = JwtKeys::new(&jwt_config(secret));
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = Claims {
        sub: subject,
        iat: (now - 3600) as usize,
        exp: (now - 60) as usize,
        iss: keys.issuer.clone(),
        aud: keys.audience.clone(),
    };
    encode(&Header::default(), &claims, &keys.encoding).unwrap()
}

#[tokio::test]
async fn register_login_and_access_protected_route() {
    let app = remote_gateway();
    let (id, token) = register_and_login(&app, "ann@x.test").await;

    let res = app
        .clone()
        .oneshot(bearer_request("GET", "/me", &token))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me = body_json(res).await;
    assert_eq!(me["id"], id.to_string());
    assert_eq!(me["email"], "ann@x.test");
    assert!(me.get("password").is_none());

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await, json!({"error": "unauthorized"}));

    let res = app
        .clone()
        .oneshot(bearer_request("GET", "/me", "garbage"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_is_conflict() {
    let app = remote_gateway();
    register_and_login(&app, "dup@x.test").await;

    let res = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({"name": "Dup", "email": "dup@x.test", "password": "pw123456"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["error"], "email already registered");
}

#[tokio::test]
async fn bad_input_uses_error_envelope() {
    let app = remote_gateway();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header("content-type", "application/json")
                .body(Body::from("{\"name\":"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"].is_string());

    let res = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({"name": "Ann", "email": "nope", "password": "pw123456"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "Invalid email");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = remote_gateway();
    register_and_login(&app, "ann@x.test").await;

    let wrong = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({"email": "ann@x.test", "password": "not-the-password"}),
        ))
        .await
        .unwrap();
    let unknown = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({"email": "nobody@x.test", "password": "pw123456"}),
        ))
        .await
        .unwrap();

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong).await, body_json(unknown).await);
}

#[tokio::test]
async fn local_and_remote_verification_reject_the_same_tokens() {
    let foreign = JwtKeys::new(&jwt_config("someone-elses-secret"))
        .sign(Uuid::new_v4())
        .unwrap();
    let rejected = [
        expired_token(SECRET, Uuid::new_v4()),
        foreign,
        "garbage".to_string(),
        "a.b.c".to_string(),
    ];

    for app in [remote_gateway(), local_gateway()] {
        let (_, token) = register_and_login(&app, "ann@x.test").await;
        let res = app
            .clone()
            .oneshot(bearer_request("GET", "/me", &token))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        for bad in &rejected {
            let res = app
                .clone()
                .oneshot(bearer_request("GET", "/me", bad))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "token {bad:?}");
        }
    }
}

struct CountingVerifier {
    calls: AtomicUsize,
}

#[async_trait]
impl TokenVerifier for CountingVerifier {
    async fn authenticate(&self, _token: &str) -> Result<Uuid, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AuthError::Unauthorized)
    }
}

#[tokio::test]
async fn missing_token_short_circuits_before_verification() {
    let verifier = Arc::new(CountingVerifier {
        calls: AtomicUsize::new(0),
    });
    let auth: Arc<dyn AuthRpc> = credential_service(SECRET);
    let app = gateway::router(GatewayState::new(auth, verifier.clone()));

    for req in [
        Request::builder().uri("/me").body(Body::empty()).unwrap(),
        Request::builder()
            .uri("/me")
            .header("authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap(),
        Request::builder()
            .uri("/me")
            .header("authorization", "Bearer ")
            .body(Body::empty())
            .unwrap(),
    ] {
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);

    let res = app
        .oneshot(bearer_request("GET", "/me", "something"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_auth_service() {
    let auth: Arc<dyn AuthRpc> =
        Arc::new(AuthClient::new("http://127.0.0.1:1", Duration::from_secs(2), 0).unwrap());
    let verifier = Arc::new(RemoteVerifier::new(Arc::clone(&auth)));
    let app = gateway::router(GatewayState::new(auth, verifier));

    // The gate answers 401 even though the cause is infrastructure.
    let res = app
        .clone()
        .oneshot(bearer_request("GET", "/me", "any-token"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Direct identity operations report the outage instead of a false 401.
    let res = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({"email": "ann@x.test", "password": "pw123456"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(res).await, json!({"error": "service unavailable"}));
}

#[tokio::test]
async fn profile_routes() {
    let app = remote_gateway();
    let (id, token) = register_and_login(&app, "ann@x.test").await;

    let res = app
        .clone()
        .oneshot(bearer_request("GET", &format!("/users/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(bearer_request("GET", &format!("/users/{}", Uuid::new_v4()), &token))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await, json!({"error": "not found"}));

    let mut update = json_request("PUT", "/me", json!({"name": "Annie"}));
    update.headers_mut().insert(
        "authorization",
        format!("Bearer {token}").parse().unwrap(),
    );
    let res = app.clone().oneshot(update).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["name"], "Annie");
    assert_ne!(body["updated_at"], body["created_at"]);

    let res = app
        .clone()
        .oneshot(bearer_request("DELETE", "/me", &token))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Tokens are stateless: still accepted, but the record is gone.
    let res = app
        .oneshot(bearer_request("GET", "/me", &token))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_user_id_uses_error_envelope() {
    let app = remote_gateway();
    let (_, token) = register_and_login(&app, "ann@x.test").await;

    let res = app
        .oneshot(bearer_request("GET", "/users/not-a-uuid", &token))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert!(body_json(res).await["error"].is_string());
}
