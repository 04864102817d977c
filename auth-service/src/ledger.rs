use chrono::{DateTime, Utc};
use common_auth::{IssuedToken, TokenError, TokenService};
use sqlx::PgPool;
use thiserror::Error;

use crate::store::{self, Grant, StoreError, UserRecord};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The presented token has no live ledger row. Covers tokens that were
    /// never issued as well as tokens already consumed and pruned.
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token already revoked")]
    Revoked,
    #[error("refresh token expired")]
    Expired,
    #[error("user for refresh token no longer exists")]
    UserGone,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Store(StoreError::Database(err))
    }
}

/// Server-side record of every refresh token issued. The JWT gives the
/// token a shape and an expiry, but the ledger row is the authority: a
/// token with no live row is dead no matter what its signature says.
#[derive(Clone)]
pub struct RefreshTokenLedger {
    pool: PgPool,
}

pub struct RotatedSession {
    pub user: UserRecord,
    pub grant: Grant,
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

impl RefreshTokenLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        user_id: i64,
        token: &str,
        device_info: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        insert_row(&self.pool, user_id, token, device_info, expires_at).await
    }

    /// Consumes `presented` and issues a fresh token pair. Single-use: the
    /// old row is claimed with a guarded UPDATE, so of any number of
    /// concurrent calls presenting the same token exactly one succeeds and
    /// the rest see `Revoked`.
    pub async fn rotate(
        &self,
        tokens: &TokenService,
        presented: &str,
        device_info: Option<&str>,
    ) -> Result<RotatedSession, LedgerError> {
        let mut tx = self.pool.begin().await?;

        let claimed: Option<(i64, DateTime<Utc>)> = sqlx::query_as(
            "UPDATE refresh_tokens SET revoked = TRUE \
             WHERE token = $1 AND revoked = FALSE \
             RETURNING user_id, expires_at",
        )
        .bind(presented)
        .fetch_optional(&mut *tx)
        .await?;

        let (user_id, expires_at) = match claimed {
            Some(row) => row,
            None => {
                // Nothing was changed, so dropping the transaction is enough.
                let revoked: Option<bool> =
                    sqlx::query_scalar("SELECT revoked FROM refresh_tokens WHERE token = $1")
                        .bind(presented)
                        .fetch_optional(&mut *tx)
                        .await?;
                return Err(match revoked {
                    Some(true) => LedgerError::Revoked,
                    _ => LedgerError::NotFound,
                });
            }
        };

        if expires_at <= Utc::now() {
            // Keep the claim: an expired token stays consumed.
            tx.commit().await?;
            return Err(LedgerError::Expired);
        }

        let user = store::find_by_id(&mut *tx, user_id)
            .await?
            .ok_or(LedgerError::UserGone)?;
        let grant = store::effective_grant(&mut *tx, &user).await?;

        let access = tokens.issue_access_token(
            user.uuid,
            &user.email,
            grant.tenant_id,
            &grant.roles,
            &grant.permissions,
        )?;
        let refresh = tokens.issue_refresh_token(user.uuid)?;

        insert_row(
            &mut *tx,
            user.id,
            &refresh.token,
            device_info,
            refresh.expires_at,
        )
        .await?;

        tx.commit().await?;

        Ok(RotatedSession {
            user,
            grant,
            access,
            refresh,
        })
    }

    /// Revokes every session the user holds. Idempotent; logout on an
    /// already-empty ledger is a no-op.
    pub async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

async fn insert_row<'e, E>(
    executor: E,
    user_id: i64,
    token: &str,
    device_info: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<(), LedgerError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token, device_info, expires_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(token)
    .bind(device_info)
    .bind(expires_at)
    .execute(executor)
    .await?;
    Ok(())
}
