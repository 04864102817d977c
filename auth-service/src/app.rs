use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common_auth::{
    enforce_tenant_boundary, ensure_permission, resolve_identity, Identity, Permission,
    SharedTenantDirectory, TenantContext, TokenService,
};
use serde_json::json;
use sqlx::PgPool;

use crate::ledger::RefreshTokenLedger;
use crate::session_handlers;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenService>,
    pub ledger: RefreshTokenLedger,
    pub directory: SharedTenantDirectory,
}

impl AppState {
    pub fn new(db: PgPool, tokens: Arc<TokenService>, directory: SharedTenantDirectory) -> Self {
        let ledger = RefreshTokenLedger::new(db.clone());
        Self {
            db,
            tokens,
            ledger,
            directory,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/v1/auth/register", post(session_handlers::register))
        .route("/api/v1/auth/login", post(session_handlers::login))
        .route("/api/v1/auth/refresh", post(session_handlers::refresh))
        .route("/api/v1/auth/logout", post(session_handlers::logout))
        .route("/api/v1/auth/me", get(session_handlers::me))
        .route(
            "/api/v1/condos/:condominium_id/summary",
            get(condo_summary),
        )
        .layer(middleware::from_fn_with_state(
            state.directory.clone(),
            enforce_tenant_boundary,
        ))
        .layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            resolve_identity,
        ))
        .with_state(state);

    Router::new().route("/healthz", get(healthz)).merge(api)
}

async fn healthz() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

/// Minimal tenant-scoped endpoint. Exists to exercise the boundary and
/// gate end to end; richer condominium features live in other services.
async fn condo_summary(identity: Identity, context: TenantContext) -> Response {
    if let Err(err) = ensure_permission(&identity, Permission::ViewDashboard) {
        return err.into_response();
    }
    (
        StatusCode::OK,
        Json(json!({
            "condominiumId": context.condominium_id,
            "viewer": identity.subject,
            "roles": identity.roles,
        })),
    )
        .into_response()
}
