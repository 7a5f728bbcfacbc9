// crates/backend-lib/src/middleware/auth.rs

//! Access guard: `Authorization: Bearer <access token>` in, `CurrentUser`
//! extension out.
use crate::error::AppError;
use crate::messages;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::token::BEARER_PREFIX;

/// The authenticated identity, inserted into request extensions
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Raw token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(messages::UNAUTHORIZED.to_string()))?;

    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized(messages::UNAUTHORIZED.to_string()))
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let claims = state.tokens.verify_access(token)?;

    // a valid token for a deleted identity is still rejected
    let Some(user) = state.users.find_identity_by_id(claims.sub).await? else {
        debug!(user_id = %claims.sub, "access token for unknown identity");
        return Err(AppError::Unauthorized(messages::UNAUTHORIZED.to_string()));
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
