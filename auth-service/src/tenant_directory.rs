use async_trait::async_trait;
use common_auth::{DirectoryError, TenantDirectory, TenantStatus};
use sqlx::PgPool;

/// Directory backed by the condominiums table. Any status other than
/// SUSPENDED counts as active; unknown ids return None and the boundary
/// middleware decides what to do with them.
#[derive(Clone)]
pub struct PgTenantDirectory {
    pool: PgPool,
}

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn status(&self, condominium_id: i64) -> Result<Option<TenantStatus>, DirectoryError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM condominiums WHERE id = $1")
                .bind(condominium_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|err| DirectoryError::Unavailable(err.to_string()))?;

        Ok(status.map(|status| {
            if status == "SUSPENDED" {
                TenantStatus::Suspended
            } else {
                TenantStatus::Active
            }
        }))
    }
}
