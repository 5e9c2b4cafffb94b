use crate::{
    db::UserFilter,
    models::User,
    state::AppState,
    utils::{config::JwtConfig, ApiError, ApiResult, ErrorCode},
};
use anyhow::anyhow;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Upper bound on token lifetime (100 years).
const MAX_EXPIRATION_HOURS: u64 = 24 * 365 * 100;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

/// Authenticated user context, attached to the request by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

/// Password digests and signed session tokens.
pub struct AuthService {
    argon2: Argon2<'static>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_hours: u64,
}

impl AuthService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if config.expiration_hours == 0 {
            validation.required_spec_claims.clear();
        }

        Self {
            argon2: Argon2::default(),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            expiration_hours: config.expiration_hours,
        }
    }

    /// Salted argon2 digest in PHC string form. Runs on the blocking pool.
    pub async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow!("failed to hash password: {e}"))
        })
        .await
        .map_err(|e| anyhow!("password hashing task failed: {e}"))?
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored digest is unreadable.
    pub async fn verify_password(&self, password: &str, digest: &str) -> anyhow::Result<bool> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let digest = digest.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&digest)
                .map_err(|e| anyhow!("stored password digest is malformed: {e}"))?;
            Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| anyhow!("password verification task failed: {e}"))?
    }

    /// Issue an HS256 token carrying the user id.
    pub fn sign_token(&self, user_id: i64) -> anyhow::Result<String> {
        let now = Utc::now();
        let exp = (self.expiration_hours > 0).then(|| {
            let hours = self.expiration_hours.min(MAX_EXPIRATION_HOURS) as i64;
            (now + Duration::hours(hours)).timestamp() as usize
        });
        let claims = Claims {
            user_id,
            iat: now.timestamp() as usize,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("failed to sign token: {e}"))
    }

    /// Check signature, algorithm and expiry, returning the claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

/// The raw `Authorization` header value, used verbatim as the token.
///
/// No `Bearer ` prefix is stripped. A missing or empty header yields `None`.
pub fn extract_auth_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .filter(|token| !token.is_empty())
}

/// Authentication middleware for protected routes
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = extract_auth_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("No token provided", ErrorCode::Unauthorized))?;

    let claims = state.auth_service.verify_token(&token).map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        ApiError::unauthorized("Invalid token", ErrorCode::Unauthorized)
    })?;

    let user = state
        .store
        .find_first(UserFilter::Id(claims.user_id))
        .await
        .map_err(|e| {
            tracing::error!(user_id = claims.user_id, error = %e, "identity lookup failed");
            ApiError::unauthorized("Invalid token", ErrorCode::Unauthorized)
        })?
        .ok_or_else(|| ApiError::unauthorized("User not found", ErrorCode::Unauthorized))?;

    request.extensions_mut().insert(AuthUser { user });
    Ok(next.run(request).await)
}
