// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! Request handlers, one module per resource.

pub mod auth;
pub mod live;
pub mod tasks;
pub mod user;
