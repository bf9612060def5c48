use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

impl JwtConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "authgate".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authgate-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    pub addr: SocketAddr,
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub store_timeout: Duration,
    pub jwt: JwtConfig,
}

impl AuthServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = bind_addr("AUTH_HOST", "AUTH_PORT", 9015)?;
        let store = match std::env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }
        Ok(Self {
            addr,
            store,
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10)?,
            store_timeout: Duration::from_millis(env_parse("STORE_TIMEOUT_MS", 5_000)?),
            jwt: JwtConfig::from_env()?,
        })
    }
}

/// How the gateway checks bearer tokens.
#[derive(Debug, Clone)]
pub enum TokenVerification {
    /// `Validate` call to the auth service per request.
    Remote,
    /// Stateless signature check with the shared secret.
    Local(JwtConfig),
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    pub auth_addr: String,
    pub rpc_timeout: Duration,
    pub rpc_retries: u32,
    pub verification: TokenVerification,
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let verification = match std::env::var("TOKEN_VERIFY").as_deref() {
            Ok("local") => TokenVerification::Local(JwtConfig::from_env()?),
            Ok("remote") | Err(_) => TokenVerification::Remote,
            Ok(other) => anyhow::bail!("unknown TOKEN_VERIFY {other:?}"),
        };
        Ok(Self {
            addr: bind_addr("APP_HOST", "APP_PORT", 9016)?,
            auth_addr: std::env::var("AUTH_ADDR")
                .unwrap_or_else(|_| "http://localhost:9015".into()),
            rpc_timeout: Duration::from_millis(env_parse("AUTH_RPC_TIMEOUT_MS", 3_000)?),
            rpc_retries: env_parse("AUTH_RPC_RETRIES", 1)?,
            verification,
        })
    }
}

fn bind_addr(host_var: &str, port_var: &str, default_port: u16) -> anyhow::Result<SocketAddr> {
    format!(
        "{}:{}",
        std::env::var(host_var).unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var(port_var).unwrap_or_else(|_| default_port.to_string())
    )
    .parse()
    .with_context(|| format!("invalid {host_var}/{port_var}"))
}

/// `default` when `key` is unset; an error naming `key` when it is set but unparsable.
fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(anyhow::anyhow!("invalid {key}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its variable names; the process environment is shared.

    #[test]
    fn env_parse_defaults_when_unset() {
        std::env::remove_var("AUTHGATE_TEST_UNSET");
        assert_eq!(env_parse("AUTHGATE_TEST_UNSET", 60_i64).unwrap(), 60);
    }

    #[test]
    fn env_parse_reads_valid_value() {
        std::env::set_var("AUTHGATE_TEST_TTL", "15");
        assert_eq!(env_parse("AUTHGATE_TEST_TTL", 60_i64).unwrap(), 15);
    }

    #[test]
    fn env_parse_rejects_garbage_and_names_the_key() {
        std::env::set_var("AUTHGATE_TEST_BAD_TTL", "abc");
        let err = env_parse("AUTHGATE_TEST_BAD_TTL", 60_i64).unwrap_err();
        assert!(err.to_string().contains("AUTHGATE_TEST_BAD_TTL"), "{err}");

        std::env::set_var("AUTHGATE_TEST_BAD_RETRIES", "-1");
        let err = env_parse("AUTHGATE_TEST_BAD_RETRIES", 1_u32).unwrap_err();
        assert!(err.to_string().contains("AUTHGATE_TEST_BAD_RETRIES"), "{err}");
    }
}
