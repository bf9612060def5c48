use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::HashedPassword;

/// User record as persisted by a [`UserStore`](super::repo::UserStore).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                      // server-assigned, immutable
    pub name: String,                  // display name
    pub email: String,                 // unique, case preserved
    pub password_hash: HashedPassword, // Argon2 hash, never plaintext
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields supplied by the caller when creating a user; id and timestamps come from the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: HashedPassword,
}
