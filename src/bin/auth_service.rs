use std::sync::Arc;

use anyhow::Context;
use authgate::{
    app,
    auth::{CredentialService, JwtKeys},
    config::{AuthServiceConfig, StoreBackend},
    rpc,
    telemetry,
    users::{InMemoryUserStore, PgUserStore, UserStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("authgate=debug,auth_service=debug,tower_http=info");

    let config = AuthServiceConfig::from_env()?;

    let store: Arc<dyn UserStore> = match config.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            Arc::new(
                PgUserStore::open(url, config.db_max_connections, config.store_timeout).await?,
            )
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory user store; records are lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let service = Arc::new(CredentialService::new(store, JwtKeys::new(&config.jwt)));
    app::serve(config.addr, rpc::server::router(service)).await
}
