// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod session;
pub mod token;
mod service;
mod service_impl;

pub use password::{
    hash_password, is_hashed, validate_password_strength, verify_password, PasswordRequirements,
    MIN_PASSWORD_LENGTH,
};
pub use service::{AuthService, LoginOutcome};
pub use service_impl::DefaultAuth;
pub use session::SessionStore;
pub use token::{Claims, TokenError, TokenIssuer, TokenPair};
