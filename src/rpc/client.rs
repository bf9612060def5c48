use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{error, warn};
use uuid::Uuid;

use super::AuthRpc;
use crate::{
    auth::dto::{
        AuthResponse, LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest,
        ValidateRequest, ValidateResponse,
    },
    error::{AuthError, ErrorBody},
};

/// Remote [`AuthRpc`] over the auth service's internal HTTP surface.
///
/// Transport failures (refused connection, timeout, broken body) come back as
/// [`AuthError::Unavailable`]; answers from the service keep their own variant.
/// Only `validate` and `get_user` are retried, and only when the connection
/// could not be established.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl AuthClient {
    pub fn new(base_url: &str, timeout: Duration, retries: u32) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("build auth rpc client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, op: &'static str, req: RequestBuilder) -> Result<Response, AuthError> {
        req.send().await.map_err(|e| transport_error(op, e))
    }

    async fn send_idempotent<F>(&self, op: &'static str, build: F) -> Result<Response, AuthError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            match build().send().await {
                Ok(res) => return Ok(res),
                Err(e) if e.is_connect() && attempt < self.retries => {
                    attempt += 1;
                    warn!(op, attempt, error = %e, "auth rpc connect failed, retrying");
                }
                Err(e) => return Err(transport_error(op, e)),
            }
        }
    }
}

fn transport_error(op: &'static str, err: reqwest::Error) -> AuthError {
    if err.is_decode() {
        error!(op, error = %err, "auth rpc returned an undecodable body");
        return AuthError::Internal(format!("{op}: {err}"));
    }
    error!(op, error = %err, "auth service unreachable");
    AuthError::Unavailable(format!("{op}: {err}"))
}

async fn remote_error(res: Response) -> AuthError {
    let status = res.status();
    let message = res
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());
    AuthError::from_status(status, message)
}

async fn decode<T: DeserializeOwned>(op: &'static str, res: Response) -> Result<T, AuthError> {
    if !res.status().is_success() {
        return Err(remote_error(res).await);
    }
    res.json::<T>().await.map_err(|e| transport_error(op, e))
}

#[async_trait]
impl AuthRpc for AuthClient {
    async fn register(&self, req: RegisterRequest) -> Result<PublicUser, AuthError> {
        let res = self
            .send("register", self.http.post(self.url("/rpc/register")).json(&req))
            .await?;
        decode("register", res).await
    }

    async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        let res = self
            .send("login", self.http.post(self.url("/rpc/login")).json(&req))
            .await?;
        decode("login", res).await
    }

    async fn validate(&self, token: &str) -> Result<ValidateResponse, AuthError> {
        let url = self.url("/rpc/validate");
        let body = ValidateRequest {
            token: token.to_owned(),
        };
        let res = self
            .send_idempotent("validate", || self.http.post(&url).json(&body))
            .await?;
        decode("validate", res).await
    }

    async fn get_user(&self, id: Uuid) -> Result<PublicUser, AuthError> {
        let url = self.url(&format!("/rpc/users/{id}"));
        let res = self
            .send_idempotent("get_user", || self.http.get(&url))
            .await?;
        decode("get_user", res).await
    }

    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<PublicUser, AuthError> {
        let url = self.url(&format!("/rpc/users/{id}"));
        let res = self
            .send("update_user", self.http.put(url).json(&req))
            .await?;
        decode("update_user", res).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AuthError> {
        let url = self.url(&format!("/rpc/users/{id}"));
        let res = self.send("delete_user", self.http.delete(url)).await?;
        if !res.status().is_success() {
            return Err(remote_error(res).await);
        }
        Ok(())
    }
}
