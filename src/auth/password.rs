use std::fmt;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

// Same algorithm and cost as `Argon2::default()`; no password verifies against it.
const DUMMY_PHC: &str = "$argon2id$v=19$m=19456,t=2,p=1$YXV0aGdhdGUtZHVtbXkhIQ$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Argon2 PHC string. Only [`hash_password`] and rows loaded from a store produce one,
/// so a plaintext password can never be handed to the store by mistake.
#[derive(Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(transparent)]
pub struct HashedPassword(String);

impl HashedPassword {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hash verified against when an account does not exist, so an unknown email
/// costs as much as a wrong password.
pub fn dummy_hash() -> &'static HashedPassword {
    lazy_static! {
        static ref DUMMY_HASH: HashedPassword = HashedPassword(DUMMY_PHC.to_string());
    }
    &DUMMY_HASH
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword([REDACTED])")
    }
}

pub fn hash_password(plain: &str) -> anyhow::Result<HashedPassword> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(HashedPassword(hash))
}

/// Argon2's verifier compares digests in constant time.
pub fn verify_password(plain: &str, hash: &HashedPassword) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash.as_str()).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
