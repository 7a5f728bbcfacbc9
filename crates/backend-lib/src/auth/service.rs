use super::token::TokenPair;
use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use tasklive_common::SignupRequest;
use uuid::Uuid;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

/// Register/login/refresh flows
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an identity. Every failure, a duplicate email included, is
    /// reported as `BadRequest` carrying the original message.
    async fn register(&self, request: SignupRequest) -> Result<User, AppError>;

    /// Check credentials and start a new session. Unknown email and wrong
    /// password fail identically.
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError>;

    /// Exchange the current refresh token for a new pair, invalidating it.
    async fn refresh(&self, user_id: Uuid, refresh_token: &str) -> Result<TokenPair, AppError>;
}
