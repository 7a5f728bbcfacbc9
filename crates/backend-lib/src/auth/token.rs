// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! JWT token issuance and verification.
//!
//! Access and refresh tokens are HS256 JWTs signed with two independent
//! secrets and lifetimes. Both carry the same identity payload; the only
//! other claims are the registered time claims and a random `jti` so that
//! two pairs minted within the same second never collide.
use crate::config::AuthSettings;
use crate::error::AppError;
use crate::messages;
use crate::models::User;
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tasklive_common::TokenPairDto;
use thiserror::Error;
use uuid::Uuid;

/// Scheme prefix used for tokens at the transport boundary
pub const BEARER_PREFIX: &str = "Bearer ";

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// User email
    pub username: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Why a token was rejected. Both map to the same unauthorized outcome at
/// the boundary but are kept apart for logging and callers that care.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed or forged")]
    Invalid,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        tracing::debug!(reason = %err, "token rejected");
        AppError::Unauthorized(messages::UNAUTHORIZED.to_string())
    }
}

/// Raw (un-prefixed) access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    /// Wire form with `Bearer ` prefixes
    pub fn to_dto(&self) -> TokenPairDto {
        TokenPairDto {
            access_token: format!("{BEARER_PREFIX}{}", self.access_token),
            refresh_token: format!("{BEARER_PREFIX}{}", self.refresh_token),
        }
    }
}

/// Strip an optional `Bearer ` prefix
pub fn strip_bearer(token: &str) -> &str {
    token.strip_prefix(BEARER_PREFIX).unwrap_or(token).trim()
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn sign(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| AppError::Internal(format!("token lifetime {:?} out of range", self.ttl)))?;
        let claims = Claims {
            sub: user.id,
            username: user.email.clone(),
            jti: Uuid::new_v4(),
            iat: now,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("jwt encode: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(strip_bearer(token), &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// Mints and verifies token pairs. Stateless apart from its keys.
pub struct TokenIssuer {
    access: SigningKey,
    refresh: SigningKey,
}

impl TokenIssuer {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            access: SigningKey::new(&settings.access_token_secret, settings.access_token_ttl()),
            refresh: SigningKey::new(&settings.refresh_token_secret, settings.refresh_token_ttl()),
        }
    }

    /// Sign a fresh access/refresh pair for `user`. The pair is only
    /// returned when both signatures succeed.
    pub fn issue(&self, user: &User) -> Result<TokenPair, AppError> {
        let access_token = self.access.sign(user)?;
        let refresh_token = self.refresh.sign(user)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.access.verify(token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.refresh.verify(token)
    }
}
