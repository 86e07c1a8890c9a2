//! Bearer-token authentication.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use nutrilog_core::{Error, Result};

use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Token signing/verification keys plus the token lifetime.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: Duration,
}

impl AuthKeys {
    /// Build from the configured secret. A missing secret is a startup
    /// error, not a silent default.
    pub fn new(secret: Option<&Secret<String>>, token_ttl_hours: i64) -> Result<Self> {
        let secret = secret
            .ok_or_else(|| Error::internal("auth.jwt_secret must be configured"))?
            .expose_secret();

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl: Duration::hours(token_ttl_hours),
        })
    }

    /// Issue a token for a freshly authenticated user.
    pub fn issue(&self, username: &str) -> Result<String> {
        let claims = Claims {
            sub: username.to_string(),
            exp: (Utc::now() + self.token_ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::internal(format!("token encoding failed: {e}")))
    }

    /// Verify a token and return the username it was issued for.
    pub fn verify(&self, token: &str) -> Result<String> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.sub)
            .map_err(|_| Error::unauthorized("invalid or expired token"))
    }
}

/// Extractor for the authenticated username.
///
/// Pulls `Authorization: Bearer <token>` and verifies it against the
/// gateway's keys; handlers taking `AuthUser` are auth-gated.
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = crate::routes::ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| Error::unauthorized("missing bearer token"))?;

        let username = state.auth.verify(token)?;
        Ok(AuthUser(username))
    }
}
