use anyhow::{Context, Result};

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 900;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 30 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_url: String,
    pub signing_key: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let signing_key = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let access_ttl_seconds = parse_or_default(
            "AUTH_ACCESS_TTL_SECONDS",
            DEFAULT_ACCESS_TTL_SECONDS,
        )?;
        let refresh_ttl_seconds = parse_or_default(
            "AUTH_REFRESH_TTL_SECONDS",
            DEFAULT_REFRESH_TTL_SECONDS,
        )?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_or_default("PORT", 8085_u16)?;

        let allowed_origins = std::env::var("AUTH_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            signing_key,
            access_ttl_seconds,
            refresh_ttl_seconds,
            host,
            port,
            allowed_origins,
        })
    }
}

fn parse_or_default<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{name} must be a valid number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
