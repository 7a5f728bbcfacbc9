// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! `/auth` handlers: signup, login, refresh.
use crate::error::AppError;
use crate::messages;
use crate::middleware::bearer_token;
use crate::validation;
use crate::AppState;
use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use std::sync::Arc;
use tasklive_common::{
    ApiResponse, LoginRequest, LoginResponse, PublicUser, SignupRequest, TokenPairDto,
};

/// `POST /auth/signup`
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PublicUser>>), AppError> {
    validation::validate_signup(&mut body)?;
    let user = state.auth.register(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(messages::USER_CREATED, user.to_public())),
    ))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    validation::validate_login(&mut body)?;
    let outcome = state.auth.login(&body.email, &body.password).await?;
    Ok(Json(ApiResponse::data(LoginResponse {
        tokens: outcome.tokens.to_dto(),
        user: outcome.user.to_public(),
    })))
}

/// `GET /auth/refresh` with the refresh token as the bearer credential
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<TokenPairDto>>, AppError> {
    let token = bearer_token(&headers)?;
    let claims = state.tokens.verify_refresh(token)?;
    let tokens = state.auth.refresh(claims.sub, token).await?;
    Ok(Json(ApiResponse::data(tokens.to_dto())))
}
