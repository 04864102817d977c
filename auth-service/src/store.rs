use chrono::Utc;
use common_auth::{BindingStatus, Permission, Role};
use sqlx::{FromRow, PgExecutor};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("corrupt role binding: {0}")]
    CorruptRole(String),
}

/// A row of the credential store. Users are never physically deleted; they
/// are soft-disabled via `is_active`.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub email: String,
    /// NULL for identities created through an external identity-assertion
    /// flow; such accounts cannot log in with a password.
    pub password_hash: Option<String>,
    pub name: String,
    pub is_active: bool,
    pub is_platform_admin: bool,
}

const USER_COLUMNS: &str = "id, uuid, email, password_hash, name, is_active, is_platform_admin";

pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<UserRecord>, StoreError>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(executor)
    .await?;
    Ok(user)
}

pub async fn find_by_uuid<'e, E>(executor: E, uuid: Uuid) -> Result<Option<UserRecord>, StoreError>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE uuid = $1"
    ))
    .bind(uuid)
    .fetch_optional(executor)
    .await?;
    Ok(user)
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<UserRecord>, StoreError>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(user)
}

/// What a user is currently entitled to. Recomputed from ACTIVE bindings at
/// login and at every refresh rotation; claims already issued keep their old
/// grant until they expire (window bounded by the access-token TTL).
#[derive(Debug, Clone)]
pub struct Grant {
    pub tenant_id: Option<i64>,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

pub async fn effective_grant<'e, E>(executor: E, user: &UserRecord) -> Result<Grant, StoreError>
where
    E: PgExecutor<'e>,
{
    // First ACTIVE binding wins; the model allows several but the session is
    // scoped to one condominium at a time.
    let binding: Option<(i64, String)> = sqlx::query_as(
        "SELECT condominium_id, role FROM condominium_role_bindings \
         WHERE user_id = $1 AND status = 'ACTIVE' ORDER BY id LIMIT 1",
    )
    .bind(user.id)
    .fetch_optional(executor)
    .await?;

    let mut tenant_id = None;
    let mut roles = Vec::new();
    if let Some((condominium_id, raw_role)) = binding {
        let role = raw_role
            .parse::<Role>()
            .map_err(|err| StoreError::CorruptRole(err.0))?;
        tenant_id = Some(condominium_id);
        roles.push(role);
    }
    if user.is_platform_admin {
        roles.push(Role::PlatformAdmin);
    }

    let mut permissions: Vec<Permission> = Vec::new();
    for role in &roles {
        for permission in role.permissions() {
            if !permissions.contains(permission) {
                permissions.push(*permission);
            }
        }
    }

    Ok(Grant {
        tenant_id,
        roles,
        permissions,
    })
}

pub async fn touch_last_login<'e, E>(executor: E, user_id: i64) -> Result<(), StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn email_exists<'e, E>(executor: E, email: &str) -> Result<bool, StoreError>
where
    E: PgExecutor<'e>,
{
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(executor)
        .await?;
    Ok(exists)
}

pub async fn condominium_exists<'e, E>(executor: E, id: i64) -> Result<bool, StoreError>
where
    E: PgExecutor<'e>,
{
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM condominiums WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await?;
    Ok(exists)
}

pub async fn insert_user<'e, E>(
    executor: E,
    email: &str,
    password_hash: Option<&str>,
    name: &str,
) -> Result<UserRecord, StoreError>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        "INSERT INTO users (uuid, email, password_hash, name) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .fetch_one(executor)
    .await?;
    Ok(user)
}

pub async fn insert_binding<'e, E>(
    executor: E,
    user_id: i64,
    condominium_id: i64,
    unit_id: Option<i64>,
    role: Role,
    status: BindingStatus,
) -> Result<(), StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO condominium_role_bindings (user_id, condominium_id, unit_id, role, status) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(condominium_id)
    .bind(unit_id)
    .bind(role.as_str())
    .bind(status.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

/// A user's binding as shown on the profile endpoint, regardless of status.
#[derive(Debug, Clone, FromRow)]
pub struct BindingRecord {
    pub condominium_id: i64,
    pub condominium_name: String,
    pub role: String,
    pub status: String,
    pub unit_id: Option<i64>,
}

pub async fn bindings_for<'e, E>(executor: E, user_id: i64) -> Result<Vec<BindingRecord>, StoreError>
where
    E: PgExecutor<'e>,
{
    let bindings = sqlx::query_as::<_, BindingRecord>(
        "SELECT b.condominium_id, c.name AS condominium_name, b.role, b.status, b.unit_id \
         FROM condominium_role_bindings b \
         JOIN condominiums c ON c.id = b.condominium_id \
         WHERE b.user_id = $1 \
         ORDER BY b.id",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;
    Ok(bindings)
}
