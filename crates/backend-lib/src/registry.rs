// ============================
// crates/backend-lib/src/registry.rs
// ============================
//! Connection registry: which live connection belongs to which user.
use dashmap::DashMap;
use metrics::gauge;
use tasklive_common::ConnectionId;
use uuid::Uuid;

use crate::metrics::REGISTRY_BOUND;

/// Maps a user to at most one live connection. The last bind wins.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, ConnectionId>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `user_id` at `connection_id`, replacing any previous binding.
    /// Returns the connection that was replaced.
    pub fn bind(&self, user_id: Uuid, connection_id: ConnectionId) -> Option<ConnectionId> {
        let previous = self.connections.insert(user_id, connection_id);
        gauge!(REGISTRY_BOUND).set(self.len() as f64);
        previous
    }

    /// The user's live connection, if any. Absence is a normal state.
    pub fn resolve(&self, user_id: Uuid) -> Option<ConnectionId> {
        self.connections.get(&user_id).map(|entry| *entry.value())
    }

    /// Drop every binding that still points at `connection_id`; a user
    /// rebound to a newer connection in the meantime is left alone.
    pub fn evict_connection(&self, connection_id: ConnectionId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|_, bound| *bound != connection_id);
        let removed = before.saturating_sub(self.connections.len());
        if removed > 0 {
            gauge!(REGISTRY_BOUND).set(self.len() as f64);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
