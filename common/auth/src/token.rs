use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::claims::{AccessClaims, RefreshClaims};
use crate::error::{ConfigError, TokenError};
use crate::permission::Permission;
use crate::roles::Role;

/// HS256 requires a key of at least 256 bits (32 bytes); anything shorter is
/// brute-forceable and refused at startup.
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// A freshly signed token with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies compact signed tokens. Verification is a pure
/// function of the token and the key: no I/O, safe to run on every request.
///
/// Constructed once during process initialization with the validated key;
/// there is no mutable signing state anywhere else.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(
        secret: &str,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Result<Self, ConfigError> {
        let bytes = secret.as_bytes();
        if bytes.len() < MIN_SIGNING_KEY_BYTES {
            return Err(ConfigError::SigningKeyTooShort {
                minimum: MIN_SIGNING_KEY_BYTES,
                actual: bytes.len(),
            });
        }
        if refresh_ttl_seconds <= access_ttl_seconds {
            return Err(ConfigError::RefreshTtlTooShort {
                access: access_ttl_seconds,
                refresh: refresh_ttl_seconds,
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            access_ttl_seconds,
            refresh_ttl_seconds,
            validation,
        })
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    pub fn issue_access_token(
        &self,
        subject: Uuid,
        email: &str,
        tenant_id: Option<i64>,
        roles: &[Role],
        permissions: &[Permission],
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.access_ttl_seconds);
        let claims = AccessClaims {
            sub: subject,
            email: email.to_owned(),
            tenant_id,
            roles: roles.to_vec(),
            permissions: permissions.to_vec(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        self.sign(&claims).map(|token| IssuedToken { token, expires_at })
    }

    pub fn issue_refresh_token(&self, subject: Uuid) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.refresh_ttl_seconds);
        let claims = RefreshClaims {
            sub: subject,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        self.sign(&claims).map(|token| IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Format-level screening of a refresh token. The ledger row stays the
    /// authority on revocation; this only rejects tokens we never signed.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    fn sign<T: serde::Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(err.to_string()),
    }
}
