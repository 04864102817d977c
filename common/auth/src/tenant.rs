use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::error::reject;
use crate::identity::Identity;

/// The tenant a request is authorized against, bound as a request extension
/// for exactly the lifetime of that request. No ambient or thread-local
/// storage is involved, so concurrent requests cannot observe each other's
/// binding and there is no cleanup step to forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub condominium_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantStatus {
    Active,
    Suspended,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("tenant directory unavailable: {0}")]
    Unavailable(String),
}

/// Narrow read-only view of the tenant collaborator: the enforcer only ever
/// asks for a condominium's suspension status.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn status(&self, condominium_id: i64) -> Result<Option<TenantStatus>, DirectoryError>;
}

pub type SharedTenantDirectory = Arc<dyn TenantDirectory>;

/// Parses the target condominium id from tenant-scoped paths of the form
/// `/api/v1/condos/{id}` or `/api/v1/condos/{id}/...`.
pub fn condominium_id_from_path(path: &str) -> Option<i64> {
    let rest = path.strip_prefix("/api/v1/condos/")?;
    let raw = rest.split('/').next()?;
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!(path, "non-numeric condominium id in path");
            None
        }
    }
}

/// Per-request middleware enforcing the isolation invariant: no identity may
/// act on a condominium other than the one it is bound to, unless it is a
/// platform administrator. Suspension is checked before ownership so a
/// suspended condominium blocks even its own members.
///
/// Anonymous requests pass through unbound; protected handlers reject them
/// with 401 at the identity extractor, keeping the 401/403 distinction.
pub async fn enforce_tenant_boundary(
    State(directory): State<SharedTenantDirectory>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(identity) = req.extensions().get::<Identity>().cloned() else {
        return next.run(req).await;
    };

    match condominium_id_from_path(req.uri().path()) {
        Some(target) => {
            let status = match directory.status(target).await {
                Ok(status) => status,
                Err(err) => {
                    error!(error = %err, condominium_id = target, "tenant status lookup failed");
                    return reject(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "SERVER_ERROR",
                        "Unable to verify condominium status.",
                    );
                }
            };

            if status == Some(TenantStatus::Suspended) && !identity.is_platform_admin() {
                warn!(
                    subject = %identity.subject,
                    condominium_id = target,
                    "request blocked: condominium suspended"
                );
                return reject(
                    StatusCode::FORBIDDEN,
                    "TENANT_SUSPENDED",
                    "This condominium is suspended. Contact the administration to regularize it.",
                );
            }

            if !identity.is_platform_admin() && identity.tenant_id != Some(target) {
                warn!(
                    subject = %identity.subject,
                    attempted = target,
                    authorized = ?identity.tenant_id,
                    "tenant boundary rejected request"
                );
                return reject(
                    StatusCode::FORBIDDEN,
                    "ACCESS_DENIED",
                    "Access denied to this condominium.",
                );
            }

            req.extensions_mut().insert(TenantContext {
                condominium_id: target,
            });
        }
        None => {
            // Not a tenant-scoped path: bind the identity's own claim, if any.
            if let Some(claimed) = identity.tenant_id {
                req.extensions_mut().insert(TenantContext {
                    condominium_id: claimed,
                });
            }
        }
    }

    next.run(req).await
}

/// Rejection when a handler demands a bound tenant and none exists. Denied
/// rather than defaulted: a missing binding must never fall back to "treat
/// as own tenant".
#[derive(Debug)]
pub struct TenantNotBound;

impl IntoResponse for TenantNotBound {
    fn into_response(self) -> Response {
        reject(
            StatusCode::FORBIDDEN,
            "ACCESS_DENIED",
            "Request is not bound to a condominium.",
        )
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = TenantNotBound;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or(TenantNotBound)
    }
}
