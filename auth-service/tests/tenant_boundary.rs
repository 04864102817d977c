mod support;

use std::sync::Arc;

use anyhow::Result;
use auth_service::app::{router, AppState};
use auth_service::tenant_directory::PgTenantDirectory;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use common_auth::TokenService;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use support::{seed_binding, seed_condominium, seed_user, TestDatabase, SIGNING_KEY};

async fn body_json(response: Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn login(app: &axum::Router, email: &str, password: &str) -> Result<String> {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": email, "password": password}).to_string(),
        ))?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let session = body_json(resp).await?;
    Ok(session["accessToken"].as_str().unwrap().to_string())
}

fn summary_request(condo: i64, bearer: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().uri(format!("/api/v1/condos/{condo}/summary"));
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::empty())?)
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires Postgres)")]
async fn boundary_isolates_condominiums_end_to_end() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else { return Ok(()); };
    let pool = db.pool_clone();

    let home = seed_condominium(&pool, "Home Condo", "ACTIVE").await?;
    let other = seed_condominium(&pool, "Other Condo", "ACTIVE").await?;
    let suspended = seed_condominium(&pool, "Suspended Condo", "SUSPENDED").await?;

    let resident = seed_user(&pool, "resident@example.com", false).await?;
    seed_binding(&pool, resident.id, home, "RESIDENT", "ACTIVE").await?;
    let admin = seed_user(&pool, "admin@example.com", true).await?;

    let tokens = Arc::new(TokenService::new(SIGNING_KEY, 300, 900)?);
    let directory = Arc::new(PgTenantDirectory::new(pool.clone()));
    let app = router(AppState::new(pool.clone(), tokens, directory));

    let resident_token = login(&app, &resident.email, &resident.password).await?;
    let admin_token = login(&app, &admin.email, &admin.password).await?;

    // Own condominium is reachable and the context carries its id.
    let resp = app
        .clone()
        .oneshot(summary_request(home, Some(&resident_token))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await?;
    assert_eq!(body["condominiumId"], json!(home));

    // Another active condominium is off limits.
    let resp = app
        .clone()
        .oneshot(summary_request(other, Some(&resident_token))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await?["code"], json!("ACCESS_DENIED"));

    // Suspension wins over ownership: the answer is TENANT_SUSPENDED even
    // for a condominium the caller is not bound to.
    let resp = app
        .clone()
        .oneshot(summary_request(suspended, Some(&resident_token))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await?["code"], json!("TENANT_SUSPENDED"));

    // No token at all dies at the identity extractor, not the boundary.
    let resp = app.clone().oneshot(summary_request(home, None)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await?["code"], json!("UNAUTHORIZED"));

    // Platform admins cross condominium lines, including suspended ones.
    let resp = app
        .clone()
        .oneshot(summary_request(other, Some(&admin_token))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app
        .clone()
        .oneshot(summary_request(suspended, Some(&admin_token))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    db.teardown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires Postgres)")]
async fn suspension_applies_immediately_to_existing_sessions() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else { return Ok(()); };
    let pool = db.pool_clone();

    let condo = seed_condominium(&pool, "Soon Suspended", "ACTIVE").await?;
    let resident = seed_user(&pool, "tenant@example.com", false).await?;
    seed_binding(&pool, resident.id, condo, "RESIDENT", "ACTIVE").await?;

    let tokens = Arc::new(TokenService::new(SIGNING_KEY, 300, 900)?);
    let directory = Arc::new(PgTenantDirectory::new(pool.clone()));
    let app = router(AppState::new(pool.clone(), tokens, directory));

    let token = login(&app, &resident.email, &resident.password).await?;

    let resp = app
        .clone()
        .oneshot(summary_request(condo, Some(&token))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    // The boundary consults the directory per request, so a token issued
    // before the suspension stops working on the next call.
    sqlx::query("UPDATE condominiums SET status = 'SUSPENDED' WHERE id = $1")
        .bind(condo)
        .execute(&pool)
        .await?;

    let resp = app
        .clone()
        .oneshot(summary_request(condo, Some(&token))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await?["code"], json!("TENANT_SUSPENDED"));

    db.teardown().await?;
    Ok(())
}
