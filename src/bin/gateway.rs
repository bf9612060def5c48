use std::sync::Arc;

use authgate::{
    app,
    auth::JwtKeys,
    config::{GatewayConfig, TokenVerification},
    gateway::{self, GatewayState, LocalVerifier, RemoteVerifier, TokenVerifier},
    rpc::{AuthClient, AuthRpc},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("authgate=debug,gateway=debug,tower_http=info");

    let config = GatewayConfig::from_env()?;
    tracing::info!(auth_addr = %config.auth_addr, "using auth service");

    let auth: Arc<dyn AuthRpc> = Arc::new(AuthClient::new(
        &config.auth_addr,
        config.rpc_timeout,
        config.rpc_retries,
    )?);

    let verifier: Arc<dyn TokenVerifier> = match &config.verification {
        TokenVerification::Remote => Arc::new(RemoteVerifier::new(Arc::clone(&auth))),
        TokenVerification::Local(jwt) => {
            tracing::info!("verifying bearer tokens locally");
            Arc::new(LocalVerifier::new(JwtKeys::new(jwt)))
        }
    };

    let state = GatewayState::new(auth, verifier);
    app::serve(config.addr, gateway::router(state)).await
}
