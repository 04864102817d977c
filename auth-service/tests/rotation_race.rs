mod support;

use std::sync::Arc;

use anyhow::Result;
use auth_service::app::{router, AppState};
use auth_service::tenant_directory::PgTenantDirectory;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common_auth::TokenService;
use serde_json::json;
use tower::util::ServiceExt;

use support::{seed_binding, seed_condominium, seed_user, TestDatabase, SIGNING_KEY};

/// Two clients presenting the same refresh token at the same time must not
/// both win: the loser sees the token as already revoked.
#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires Postgres)")]
async fn concurrent_rotation_has_exactly_one_winner() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else { return Ok(()); };
    let pool = db.pool_clone();

    let condo = seed_condominium(&pool, "Parque Central", "ACTIVE").await?;
    let user = seed_user(&pool, "race@example.com", false).await?;
    seed_binding(&pool, user.id, condo, "RESIDENT", "ACTIVE").await?;

    let tokens = Arc::new(TokenService::new(SIGNING_KEY, 300, 900)?);
    let directory = Arc::new(PgTenantDirectory::new(pool.clone()));
    let app = router(AppState::new(pool.clone(), tokens, directory));

    let login = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": user.email, "password": user.password}).to_string(),
        ))?;
    let resp = app.clone().oneshot(login).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let session: serde_json::Value = serde_json::from_slice(&bytes)?;
    let refresh = session["refreshToken"].as_str().unwrap().to_string();

    let make_refresh = |token: String| {
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/refresh")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"refreshToken": token}).to_string()))
    };

    let (first, second) = tokio::join!(
        app.clone().oneshot(make_refresh(refresh.clone())?),
        app.clone().oneshot(make_refresh(refresh.clone())?),
    );
    let statuses = [first?.status(), second?.status()];

    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::OK).count(),
        1,
        "exactly one rotation must win, got {statuses:?}"
    );
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::UNAUTHORIZED)
            .count(),
        1,
        "the losing rotation must be rejected, got {statuses:?}"
    );

    // The ledger holds exactly one live row for the user afterwards.
    let live: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1 AND revoked = FALSE",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(live, 1);

    db.teardown().await?;
    Ok(())
}
