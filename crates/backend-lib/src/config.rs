// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered with `figment`: compiled defaults, then an optional
//! TOML file, then `TASKLIVE_`-prefixed environment variables (`__` separates
//! nested keys, e.g. `TASKLIVE_AUTH__ACCESS_TOKEN_SECRET`). Missing secrets
//! or malformed values are rejected here, before the server starts.
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;


/// Default configuration file looked up by [`Settings::load`]
pub const DEFAULT_CONFIG_FILE: &str = "tasklive.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TASKLIVE_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Upper bound for either token lifetime (ten years)
pub const MAX_TOKEN_TTL_SECS: u64 = 60 * 60 * 24 * 365 * 10;

/// Upper bound for the event bus buffer
pub const MAX_EVENT_CAPACITY: usize = 1 << 20;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Token secrets and lifetimes
    pub auth: AuthSettings,
    /// In-process event bus
    pub events: EventSettings,
}

/// Token signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub access_token_secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_secret: String,
    pub refresh_token_ttl_secs: u64,
}

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    /// Events buffered per subscriber before the slowest one starts losing them
    pub capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_json: false,
            auth: AuthSettings::default(),
            events: EventSettings::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        // secrets have no default on purpose; validate() rejects them empty
        Self {
            access_token_secret: String::new(),
            access_token_ttl_secs: 15 * 60,
            refresh_token_secret: String::new(),
            refresh_token_ttl_secs: 60 * 60 * 24 * 7,
        }
    }
}

impl Default for EventSettings {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

impl AuthSettings {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }
}

impl Settings {
    /// Load settings from `tasklive.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from an explicit TOML file and the environment.
    ///
    /// A missing file is not an error; the defaults and environment still
    /// apply. The result is not validated, so callers can apply CLI
    /// overrides before calling [`Settings::validate`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(settings)
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("unknown log level `{}`", self.log_level);
        }

        let auth = &self.auth;
        if auth.access_token_secret.trim().is_empty() {
            bail!("auth.access_token_secret must be set");
        }
        if auth.refresh_token_secret.trim().is_empty() {
            bail!("auth.refresh_token_secret must be set");
        }
        if auth.access_token_secret == auth.refresh_token_secret {
            bail!("access and refresh tokens must be signed with different secrets");
        }
        if auth.access_token_ttl_secs == 0 || auth.refresh_token_ttl_secs == 0 {
            bail!("token lifetimes must be greater than zero");
        }
        if auth.access_token_ttl_secs > MAX_TOKEN_TTL_SECS
            || auth.refresh_token_ttl_secs > MAX_TOKEN_TTL_SECS
        {
            bail!("token lifetimes must not exceed {MAX_TOKEN_TTL_SECS} seconds");
        }
        if auth.access_token_ttl_secs >= auth.refresh_token_ttl_secs {
            bail!("access token lifetime must be shorter than refresh token lifetime");
        }

        if self.events.capacity == 0 || self.events.capacity > MAX_EVENT_CAPACITY {
            bail!("events.capacity must be between 1 and {MAX_EVENT_CAPACITY}");
        }

        Ok(())
    }
}
