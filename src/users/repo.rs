use std::{future::Future, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use super::repo_types::{NewUser, User};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("email already in use")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for user records.
///
/// Implementations must make `create` and `update` compare-and-write on the email
/// index: two concurrent writers of the same email end with exactly one `Conflict`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Assigns id and timestamps (`created_at == updated_at`).
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError>;
    /// Blank emails never match.
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;
    /// Overwrites name, email and password hash of `user.id` and moves `updated_at` forward.
    async fn update(&self, user: &User) -> Result<User, StoreError>;
    /// Hard delete.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store. Every query is bounded by `timeout`.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self::new(db, timeout))
    }

    /// Connects and applies migrations. Email uniqueness rests on the migrated
    /// `UNIQUE(email)` constraint, so a failed migration is an error.
    pub async fn open(
        database_url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let store = Self::connect(database_url, max_connections, timeout).await?;
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(|e| map_sqlx_error(op, e)),
            Err(_) => {
                error!(op, timeout_ms = self.timeout.as_millis() as u64, "store query timed out");
                Err(StoreError::Unavailable(format!("{op} timed out")))
            }
        }
    }
}

fn map_sqlx_error(op: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict,
        other => {
            error!(op, error = %other, "store query failed");
            StoreError::Unavailable(other.to_string())
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let id = Uuid::new_v4();
        let query = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .fetch_one(&self.db);
        let created = self.bounded("create", query).await?;
        debug!(user_id = %created.id, "user row inserted");
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db);
        self.bounded("get_by_id", query)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        if email.trim().is_empty() {
            return Err(StoreError::NotFound);
        }
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db);
        self.bounded("get_by_email", query)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        // timestamptz has microsecond precision; bump by one tick if the clock hasn't moved.
        let query = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2,
                email = $3,
                password_hash = $4,
                updated_at = GREATEST(clock_timestamp(), updated_at + interval '1 microsecond')
            WHERE id = $1
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .fetch_optional(&self.db);
        self.bounded("update", query)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let query = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db);
        let result = self.bounded("delete", query).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
