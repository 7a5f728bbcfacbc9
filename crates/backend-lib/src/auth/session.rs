// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Refresh-token session state.
//!
//! Each user has at most one valid refresh token, persisted as an scrypt hash
//! on the identity. Every write of that hash and every compare-then-rotate
//! runs under a per-user async lock, so two refreshes racing on the same
//! token are serialized: the first rotates, the second sees the new hash and
//! fails.
use super::password;
use super::token::TokenPair;
use crate::error::AppError;
use crate::messages;
use crate::models::{IdentityPatch, User};
use crate::storage::IdentityStore;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

type LockMap = DashMap<Uuid, Arc<Mutex<()>>>;

/// Held per-user lock. On drop the map entry goes too unless another caller
/// already holds or awaits it.
struct UserLock {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
    user_id: Uuid,
}

impl Drop for UserLock {
    fn drop(&mut self) {
        drop(self.guard.take());
        // the map's own reference is the only one left when nobody waits;
        // a concurrent `entry` blocks on the same shard, so it cannot slip in
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Session store for refresh tokens
#[derive(Clone)]
pub struct SessionStore {
    users: Arc<dyn IdentityStore>,
    locks: Arc<LockMap>,
}

impl SessionStore {
    pub fn new(users: Arc<dyn IdentityStore>) -> Self {
        Self {
            users,
            locks: Arc::new(DashMap::new()),
        }
    }

    async fn lock_user(&self, user_id: Uuid) -> UserLock {
        // clone the Arc out so the map shard is not held across the await
        let lock = self.locks.entry(user_id).or_default().clone();
        UserLock {
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
            user_id,
        }
    }

    /// Hash and persist `refresh_token` as the user's only valid token,
    /// overwriting any previous one.
    pub async fn save_refresh_token(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AppError> {
        let _guard = self.lock_user(user_id).await;
        self.write_refresh_hash(user_id, refresh_token).await
    }

    /// Compare `presented` against the stored hash.
    ///
    /// `NotFound` if the user does not exist, `Unauthorized` if no session
    /// was ever started.
    pub async fn verify_refresh_token(&self, user_id: Uuid, presented: &str) -> Result<bool, AppError> {
        let user = self.users.find_identity_by_id_or_fail(user_id).await?;
        Self::matches_stored(&user, presented).await
    }

    /// Stamp the last-login time
    pub async fn record_login(&self, user_id: Uuid) -> Result<(), AppError> {
        let patch = IdentityPatch {
            last_login: Some(Utc::now()),
            ..IdentityPatch::default()
        };
        self.users.update_identity(user_id, patch).await?;
        Ok(())
    }

    /// Atomically check `presented` and replace it with the refresh token of
    /// a freshly issued pair.
    ///
    /// `issue` runs only after the presented token matched; the new hash is
    /// written before the lock is released, so the old token is dead for
    /// every later caller, retries included.
    pub async fn rotate<F>(&self, user_id: Uuid, presented: &str, issue: F) -> Result<TokenPair, AppError>
    where
        F: FnOnce(&User) -> Result<TokenPair, AppError> + Send,
    {
        let _guard = self.lock_user(user_id).await;

        let user = self.users.find_identity_by_id_or_fail(user_id).await?;
        if !Self::matches_stored(&user, presented).await? {
            debug!(%user_id, "stale or unknown refresh token presented");
            return Err(AppError::Unauthorized(messages::WRONG_REFRESH_TOKEN.to_string()));
        }

        let tokens = issue(&user)?;
        self.write_refresh_hash(user_id, &tokens.refresh_token).await?;
        Ok(tokens)
    }

    async fn matches_stored(user: &User, presented: &str) -> Result<bool, AppError> {
        let hash = user
            .refresh_token_hash
            .clone()
            .ok_or_else(|| AppError::Unauthorized(messages::UNAUTHORIZED.to_string()))?;
        Ok(password::verify_password_async(hash, presented.to_string()).await)
    }

    async fn write_refresh_hash(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AppError> {
        let hash = password::hash_password_async(refresh_token.to_string()).await?;
        let patch = IdentityPatch {
            refresh_token_hash: Some(hash),
            ..IdentityPatch::default()
        };
        self.users.update_identity(user_id, patch).await?;
        Ok(())
    }
}
