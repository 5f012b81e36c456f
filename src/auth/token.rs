//! HS256 bearer tokens. Claims embed the subject phone and, when issued
//! by login/registration, the session identifier that must still match
//! the identity's stored `session_id` at validation time.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::TOKEN_EXPIRE_DAYS;

use super::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity's phone number.
    pub sub: String,
    /// Session identifier; tokens carrying one are rejected once a
    /// newer login stores a different id on the identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Issue a token for `phone` with the standard 7-day expiry.
pub fn issue_token(
    secret: &[u8],
    phone: &str,
    session_id: Option<&str>,
) -> Result<String, AuthError> {
    issue_token_with_ttl(secret, phone, session_id, Duration::days(TOKEN_EXPIRE_DAYS))
}

pub fn issue_token_with_ttl(
    secret: &[u8],
    phone: &str,
    session_id: Option<&str>,
    ttl: Duration,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: phone.to_string(),
        sid: session_id.map(str::to_string),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AuthError::Encoding(e.to_string()))
}

/// Verify signature and expiry; returns the embedded claims.
pub fn verify_token(secret: &[u8], token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::Unauthenticated)
}
