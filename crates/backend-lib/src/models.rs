// ================
// crates/backend-lib/src/models.rs
// ================
//! Server-side identity model.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tasklive_common::{ConnectionId, PublicUser};
use uuid::Uuid;

/// A registered user as persisted.
///
/// `password` always holds a hash once the record is durable. The session
/// (`refresh_token_hash`, `last_login`) and transport (`connection_id`)
/// fields are internal and never serialized to clients; use
/// [`User::to_public`] at the boundary.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password: String,
    pub refresh_token_hash: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub connection_id: Option<ConnectionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("has_session", &self.refresh_token_hash.is_some())
            .field("last_login", &self.last_login)
            .field("connection_id", &self.connection_id)
            .finish_non_exhaustive()
    }
}

/// Data required to create an identity. `password` is plaintext (or an
/// existing hash) and is hashed by the store before the record is durable.
#[derive(Clone)]
pub struct NewIdentity {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}

/// Partial update of an identity; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentityPatch {
    pub name: Option<String>,
    pub password: Option<String>,
    pub refresh_token_hash: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub connection_id: Option<ConnectionId>,
}
