// ============================
// crates/backend-lib/src/handlers/live.rs
// ============================
//! Live channel handlers: binding a connection to a user and answering
//! client frames.
use crate::error::AppError;
use crate::models::IdentityPatch;
use crate::AppState;
use tasklive_common::{ClientToServer, ConnectionId};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// A connection opened with an optional announced user
pub async fn on_connect(state: &AppState, connection_id: ConnectionId, announced: Option<&str>) {
    let Some(raw) = announced else {
        return;
    };
    match Uuid::parse_str(raw) {
        Ok(user_id) => on_explicit_bind(state, connection_id, user_id).await,
        Err(e) => debug!(%connection_id, error = %e, "ignoring malformed userId on connect"),
    }
}

/// A bind request for an already-open connection. Failures are logged only;
/// the connection stays open either way.
pub async fn on_explicit_bind(state: &AppState, connection_id: ConnectionId, user_id: Uuid) {
    if let Err(e) = bind_user(state, connection_id, user_id).await {
        warn!(%connection_id, %user_id, error = %e, "live bind failed");
    }
}

/// Point `user_id` at this connection, persist it on the identity, then push
/// the current task list right away.
///
/// Returns `Ok(false)` when the user does not exist.
#[instrument(skip(state))]
pub async fn bind_user(state: &AppState, connection_id: ConnectionId, user_id: Uuid) -> Result<bool, AppError> {
    let Some(user) = state.users.find_identity_by_id(user_id).await? else {
        error!("live bind for unknown user");
        return Ok(false);
    };

    if let Some(previous) = state.registry.bind(user.id, connection_id) {
        debug!(%previous, "replaced previous live connection");
    }

    let patch = IdentityPatch {
        connection_id: Some(connection_id),
        ..IdentityPatch::default()
    };
    let user = state.users.update_identity(user.id, patch).await?;

    state.dispatcher.notify(&user).await?;
    Ok(true)
}

/// Dispatch one parsed client frame
pub async fn handle_client_message(state: &AppState, connection_id: ConnectionId, message: ClientToServer) {
    match message {
        ClientToServer::TaskEvent { user_id } => {
            on_explicit_bind(state, connection_id, user_id).await;
        },
    }
}
