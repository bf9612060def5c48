use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest,
            ValidateResponse,
        },
        jwt::JwtKeys,
        password::{self, dummy_hash, HashedPassword},
    },
    error::AuthError,
    rpc::AuthRpc,
    users::{NewUser, StoreError, UserStore},
};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validated_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidInput("Name is required".into()));
    }
    Ok(name.to_string())
}

fn validated_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(AuthError::InvalidInput("Invalid email".into()));
    }
    Ok(email.to_string())
}

fn validated_password(password: &str) -> Result<&str, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidInput("Password too short".into()));
    }
    Ok(password)
}

/// Login must not reveal whether an account exists: a missing email is reported
/// exactly like a wrong password. Store outages still surface as `Unavailable`.
fn conceal_unknown_account(err: StoreError) -> AuthError {
    match err {
        StoreError::NotFound => AuthError::Unauthorized,
        other => other.into(),
    }
}

async fn hash_off_thread(plain: &str) -> Result<HashedPassword, AuthError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| AuthError::Internal(e.to_string()))
}

async fn verify_off_thread(plain: &str, hash: HashedPassword) -> Result<bool, AuthError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| AuthError::Internal(e.to_string()))
}

/// Turns credentials into identities and signed tokens.
pub struct CredentialService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl CredentialService {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    #[instrument(skip(self, name, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, AuthError> {
        let name = validated_name(name)?;
        let email = validated_email(email)?;
        let password = validated_password(password)?;

        let password_hash = hash_off_thread(password).await?;
        let user = self
            .store
            .create(NewUser {
                name,
                email,
                password_hash,
            })
            .await
            .map_err(|e| {
                if e == StoreError::Conflict {
                    warn!("email already registered");
                } else {
                    error!(error = %e, "create user failed");
                }
                AuthError::from(e)
            })?;

        info!(user_id = %user.id, "user registered");
        Ok(user.into())
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let email = email.trim();
        let user = match self.store.get_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                warn!("login unknown email");
                verify_off_thread(password, dummy_hash().clone()).await?;
                return Err(conceal_unknown_account(StoreError::NotFound));
            }
            Err(e) => {
                error!(error = %e, "get_by_email failed");
                return Err(conceal_unknown_account(e));
            }
        };

        if !verify_off_thread(password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::Unauthorized);
        }

        let token = self.keys.sign(user.id).map_err(|e| {
            error!(error = %e, "jwt sign failed");
            AuthError::Internal(e.to_string())
        })?;

        info!(user_id = %user.id, "user logged in");
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    pub fn validate(&self, token: &str) -> Result<ValidateResponse, AuthError> {
        let claims = self.keys.verify(token).map_err(|e| {
            debug!(reason = %e, "token rejected");
            AuthError::Unauthorized
        })?;
        Ok(ValidateResponse {
            subject: claims.sub,
            valid: true,
        })
    }

    /// Profile lookup by id keeps `NotFound` as is; only login hides it.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<PublicUser, AuthError> {
        let user = self.store.get_by_id(id).await?;
        Ok(user.into())
    }

    #[instrument(skip(self, changes))]
    pub async fn update_user(
        &self,
        id: Uuid,
        changes: UpdateUserRequest,
    ) -> Result<PublicUser, AuthError> {
        let mut user = self.store.get_by_id(id).await?;

        if let Some(name) = changes.name.as_deref() {
            user.name = validated_name(name)?;
        }
        if let Some(email) = changes.email.as_deref() {
            user.email = validated_email(email)?;
        }
        if let Some(password) = changes.password.as_deref() {
            user.password_hash = hash_off_thread(validated_password(password)?).await?;
        }

        let updated = self.store.update(&user).await?;
        info!(user_id = %updated.id, "user updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> Result<(), AuthError> {
        self.store.delete(id).await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}

#[async_trait]
impl AuthRpc for CredentialService {
    async fn register(&self, req: RegisterRequest) -> Result<PublicUser, AuthError> {
        CredentialService::register(self, &req.name, &req.email, &req.password).await
    }

    async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        CredentialService::login(self, &req.email, &req.password).await
    }

    async fn validate(&self, token: &str) -> Result<ValidateResponse, AuthError> {
        CredentialService::validate(self, token)
    }

    async fn get_user(&self, id: Uuid) -> Result<PublicUser, AuthError> {
        CredentialService::get_user(self, id).await
    }

    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<PublicUser, AuthError> {
        CredentialService::update_user(self, id, req).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AuthError> {
        CredentialService::delete_user(self, id).await
    }
}
