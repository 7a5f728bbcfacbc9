// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_ACTIVE: &str = "ws.active";
pub const REGISTRY_BOUND: &str = "registry.bound";
pub const AUTH_REGISTER: &str = "auth.register";
pub const AUTH_LOGIN: &str = "auth.login";
pub const AUTH_LOGIN_FAILED: &str = "auth.login.failed";
pub const AUTH_REFRESH: &str = "auth.refresh";
pub const AUTH_REFRESH_REJECTED: &str = "auth.refresh.rejected";
pub const EVENT_PUBLISHED: &str = "event.published";
pub const NOTIFY_PUSHED: &str = "notify.pushed";
pub const NOTIFY_DROPPED: &str = "notify.dropped";
