use std::collections::HashMap;

use async_trait::async_trait;
use time::{Duration as TimeDuration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, User};

/// Process-local store for tests and single-node development.
///
/// The email index is checked and written under the same write lock as the
/// record itself, which gives the same compare-and-create guarantee as the
/// unique constraint in PostgreSQL.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(&user.email) {
            return Err(StoreError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.by_email.insert(record.email.clone(), record.id);
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.inner
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        if email.trim().is_empty() {
            return Err(StoreError::NotFound);
        }
        let inner = self.inner.read().await;
        inner
            .by_email
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let previous = inner.users.get(&user.id).cloned().ok_or(StoreError::NotFound)?;

        if previous.email != user.email {
            if inner.by_email.contains_key(&user.email) {
                return Err(StoreError::Conflict);
            }
            inner.by_email.remove(&previous.email);
            inner.by_email.insert(user.email.clone(), user.id);
        }

        let now = OffsetDateTime::now_utc();
        let record = User {
            id: previous.id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: previous.created_at,
            updated_at: now.max(previous.updated_at + TimeDuration::microseconds(1)),
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner.users.remove(&id).ok_or(StoreError::NotFound)?;
        inner.by_email.remove(&removed.email);
        Ok(())
    }
}
