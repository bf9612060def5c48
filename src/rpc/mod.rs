//! The auth service's request/response contract.
//!
//! [`AuthRpc`] is implemented in-process by
//! [`CredentialService`](crate::auth::services::CredentialService) and remotely by
//! [`AuthClient`](client::AuthClient). Both report the same [`AuthError`] variants, so a
//! caller cannot tell them apart except that only the remote one can fail with
//! [`AuthError::Unavailable`] for transport reasons.

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::dto::{
    AuthResponse, LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest, ValidateResponse,
};
use crate::error::AuthError;

pub mod client;
pub mod server;

pub use client::AuthClient;

#[async_trait]
pub trait AuthRpc: Send + Sync {
    /// Not idempotent: a second call with the same email fails with `Conflict`.
    async fn register(&self, req: RegisterRequest) -> Result<PublicUser, AuthError>;
    /// Not idempotent: each success issues a fresh token.
    async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError>;
    /// Idempotent.
    async fn validate(&self, token: &str) -> Result<ValidateResponse, AuthError>;
    async fn get_user(&self, id: Uuid) -> Result<PublicUser, AuthError>;
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest)
        -> Result<PublicUser, AuthError>;
    async fn delete_user(&self, id: Uuid) -> Result<(), AuthError>;
}
