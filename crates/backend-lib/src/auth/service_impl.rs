use super::service::{AuthService, LoginOutcome};
use super::token::{TokenIssuer, TokenPair};
use super::{password, SessionStore};
use crate::error::AppError;
use crate::messages;
use crate::metrics::{
    AUTH_LOGIN, AUTH_LOGIN_FAILED, AUTH_REFRESH, AUTH_REFRESH_REJECTED, AUTH_REGISTER,
};
use crate::models::{NewIdentity, User};
use crate::storage::IdentityStore;
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tasklive_common::SignupRequest;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Auth orchestrator over an identity store, the session store and the
/// token issuer
pub struct DefaultAuth {
    users: Arc<dyn IdentityStore>,
    sessions: SessionStore,
    tokens: Arc<TokenIssuer>,
}

impl DefaultAuth {
    pub fn new(users: Arc<dyn IdentityStore>, sessions: SessionStore, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            users,
            sessions,
            tokens,
        }
    }

    async fn try_register(&self, request: SignupRequest) -> Result<User, AppError> {
        let email = request.email.trim().to_lowercase();
        if self.users.find_identity_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(messages::existing_resource("User")));
        }
        self.users
            .persist_identity(NewIdentity {
                email,
                name: request.name,
                password: request.password,
            })
            .await
    }

    async fn validate_credentials(&self, email: &str, password: &str) -> Result<Option<User>, AppError> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.users.find_identity_by_email(&email).await? else {
            password::verify_dummy_async(password.to_string()).await;
            return Ok(None);
        };
        if password::verify_password_async(user.password.clone(), password.to_string()).await {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    #[instrument(skip_all, fields(email = %request.email))]
    async fn register(&self, request: SignupRequest) -> Result<User, AppError> {
        let user = self.try_register(request).await.map_err(|err| {
            debug!(error = %err, "registration failed");
            AppError::BadRequest(err.to_string())
        })?;
        counter!(AUTH_REGISTER).increment(1);
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let Some(user) = self.validate_credentials(email, password).await? else {
            counter!(AUTH_LOGIN_FAILED).increment(1);
            return Err(AppError::Unauthorized(messages::INVALID_CREDENTIALS.to_string()));
        };

        let tokens = self.tokens.issue(&user)?;
        tokio::try_join!(
            self.sessions.save_refresh_token(user.id, &tokens.refresh_token),
            self.sessions.record_login(user.id),
        )?;

        counter!(AUTH_LOGIN).increment(1);
        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome { user, tokens })
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, user_id: Uuid, refresh_token: &str) -> Result<TokenPair, AppError> {
        let tokens = self.tokens.clone();
        let result = self
            .sessions
            .rotate(user_id, refresh_token, move |user| tokens.issue(user))
            .await;

        match &result {
            Ok(_) => counter!(AUTH_REFRESH).increment(1),
            Err(_) => counter!(AUTH_REFRESH_REJECTED).increment(1),
        }
        result
    }
}
