use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common_auth::{reject, BindingStatus, Identity, Role, TokenError};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::ledger::LedgerError;
use crate::store::{self, Grant, StoreError, UserRecord};

#[derive(Debug)]
pub struct SessionError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl SessionError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn invalid_credentials() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Invalid email or password",
        )
    }

    fn use_external_login() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "USE_EXTERNAL_LOGIN",
            "This account has no password; use the external login flow",
        )
    }

    fn account_disabled() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "ACCOUNT_DISABLED",
            "Account is disabled",
        )
    }

    fn email_already_exists() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "EMAIL_ALREADY_EXISTS",
            "An account with this email already exists",
        )
    }

    fn condominium_not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "CONDOMINIUM_NOT_FOUND",
            "Condominium does not exist",
        )
    }

    fn internal(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", message)
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        reject(self.status, self.code, self.message)
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        error!("credential store failure: {err}");
        SessionError::internal("Internal server error")
    }
}

impl From<LedgerError> for SessionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound | LedgerError::Token(_) => SessionError::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_REFRESH_TOKEN",
                "Refresh token is not recognized",
            ),
            LedgerError::Revoked => SessionError::new(
                StatusCode::UNAUTHORIZED,
                "REFRESH_TOKEN_REVOKED",
                "Refresh token has already been used or revoked",
            ),
            LedgerError::Expired => SessionError::new(
                StatusCode::UNAUTHORIZED,
                "REFRESH_TOKEN_EXPIRED",
                "Refresh token has expired",
            ),
            LedgerError::UserGone => SessionError::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_REFRESH_TOKEN",
                "Refresh token is not recognized",
            ),
            LedgerError::Store(store_err) => store_err.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub condominium_id: i64,
    pub unit_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
    pub user: UserInfo,
}

fn session_response(
    state: &AppState,
    user: &UserRecord,
    grant: &Grant,
    access_token: String,
    refresh_token: String,
) -> SessionResponse {
    SessionResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.tokens.access_ttl_seconds(),
        refresh_expires_in: state.tokens.refresh_ttl_seconds(),
        user: UserInfo {
            id: user.uuid,
            email: user.email.clone(),
            name: user.name.clone(),
            tenant_id: grant.tenant_id,
            roles: grant.roles.clone(),
        },
    }
}

fn device_info(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, SessionError> {
    let user = store::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(SessionError::invalid_credentials)?;

    let hash = match user.password_hash.as_deref() {
        Some(hash) => hash,
        None => return Err(SessionError::use_external_login()),
    };

    let parsed = PasswordHash::new(hash).map_err(|err| {
        error!(user = %user.uuid, "stored password hash unparseable: {err}");
        SessionError::internal("Internal server error")
    })?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed)
        .is_err()
    {
        warn!(email = %payload.email, "login rejected: bad password");
        return Err(SessionError::invalid_credentials());
    }

    if !user.is_active {
        return Err(SessionError::account_disabled());
    }

    let grant = store::effective_grant(&state.db, &user).await?;

    let access = state
        .tokens
        .issue_access_token(
            user.uuid,
            &user.email,
            grant.tenant_id,
            &grant.roles,
            &grant.permissions,
        )
        .map_err(signing_failure)?;
    let refresh = state
        .tokens
        .issue_refresh_token(user.uuid)
        .map_err(signing_failure)?;

    state
        .ledger
        .insert(
            user.id,
            &refresh.token,
            device_info(&headers),
            refresh.expires_at,
        )
        .await?;

    if let Err(err) = store::touch_last_login(&state.db, user.id).await {
        warn!(user = %user.uuid, "failed to record last login: {err}");
    }

    let body = session_response(&state, &user, &grant, access.token, refresh.token);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RefreshRequest>,
) -> Result<Response, SessionError> {
    // Screen the token shape before touching the ledger; tokens we never
    // signed cannot consume anything. An expired signature still goes to
    // the ledger: a revoked or deleted row must answer as revoked or
    // not-found, not as expired.
    match state.tokens.verify_refresh(&payload.refresh_token) {
        Ok(_) | Err(TokenError::Expired) => {}
        Err(_) => return Err(LedgerError::NotFound.into()),
    }

    let rotated = state
        .ledger
        .rotate(&state.tokens, &payload.refresh_token, device_info(&headers))
        .await?;

    let body = session_response(
        &state,
        &rotated.user,
        &rotated.grant,
        rotated.access.token,
        rotated.refresh.token,
    );
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Response, SessionError> {
    let user = store::find_by_uuid(&state.db, identity.subject).await?;
    if let Some(user) = user {
        let revoked = state.ledger.revoke_all_for_user(user.id).await?;
        tracing::debug!(user = %user.uuid, revoked, "sessions revoked on logout");
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, SessionError> {
    if store::email_exists(&state.db, &payload.email).await? {
        return Err(SessionError::email_already_exists());
    }
    if !store::condominium_exists(&state.db, payload.condominium_id).await? {
        return Err(SessionError::condominium_not_found());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            error!("password hashing failed: {err}");
            SessionError::internal("Internal server error")
        })?;

    let mut tx = state.db.begin().await.map_err(StoreError::Database)?;
    let user =
        store::insert_user(&mut *tx, &payload.email, Some(&password_hash), &payload.name).await?;
    store::insert_binding(
        &mut *tx,
        user.id,
        payload.condominium_id,
        payload.unit_id,
        Role::Resident,
        BindingStatus::PendingApproval,
    )
    .await?;
    tx.commit().await.map_err(StoreError::Database)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": {
                "id": user.uuid,
                "email": user.email,
                "name": user.name,
                "status": BindingStatus::PendingApproval.as_str(),
            }
        })),
    )
        .into_response())
}

pub async fn me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Response, SessionError> {
    let user = store::find_by_uuid(&state.db, identity.subject)
        .await?
        .ok_or_else(|| {
            warn!(subject = %identity.subject, "valid token for unknown user");
            SessionError::invalid_credentials()
        })?;
    let bindings = store::bindings_for(&state.db, user.id).await?;

    let bindings: Vec<_> = bindings
        .into_iter()
        .map(|binding| {
            json!({
                "condominiumId": binding.condominium_id,
                "condominiumName": binding.condominium_name,
                "role": binding.role,
                "status": binding.status,
                "unitId": binding.unit_id,
            })
        })
        .collect();

    Ok(Json(json!({
        "id": user.uuid,
        "email": user.email,
        "name": user.name,
        "isPlatformAdmin": user.is_platform_admin,
        "roles": identity.roles,
        "permissions": identity.permissions,
        "bindings": bindings,
    }))
    .into_response())
}

fn signing_failure(err: TokenError) -> SessionError {
    error!("token signing failed: {err}");
    SessionError::internal("Internal server error")
}
