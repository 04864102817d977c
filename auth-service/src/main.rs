use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use common_auth::TokenService;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use auth_service::app::{router, AppState};
use auth_service::config::ServiceConfig;
use auth_service::tenant_directory::PgTenantDirectory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServiceConfig::from_env()?;

    let db = PgPool::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let tokens = Arc::new(TokenService::new(
        &config.signing_key,
        config.access_ttl_seconds,
        config.refresh_ttl_seconds,
    )?);
    let directory = Arc::new(PgTenantDirectory::new(db.clone()));
    let state = AppState::new(db, tokens, directory);

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid CORS origin")?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION]);

    let app = router(state).layer(cors);

    let ip: std::net::IpAddr = config.host.parse().context("invalid HOST")?;
    let addr = SocketAddr::from((ip, config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "auth-service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
