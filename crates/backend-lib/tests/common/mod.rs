#![allow(dead_code)]

use backend_lib::config::{AuthSettings, EventSettings, Settings};
use backend_lib::storage::FlatFileStorage;
use backend_lib::AppState;
use std::sync::Arc;
use tempfile::TempDir;

pub const PASSWORD: &str = "Abcd123!";

pub fn test_settings(temp_dir: &TempDir) -> Settings {
    Settings {
        data_dir: temp_dir.path().to_path_buf(),
        auth: AuthSettings {
            access_token_secret: "test-access-secret".to_string(),
            access_token_ttl_secs: 60,
            refresh_token_secret: "test-refresh-secret".to_string(),
            refresh_token_ttl_secs: 3600,
        },
        events: EventSettings { capacity: 64 },
        ..Settings::default()
    }
}

/// Fresh state over a throwaway data dir. Keep the `TempDir` alive for the
/// duration of the test.
pub fn test_state() -> (Arc<AppState>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let storage = FlatFileStorage::new(temp_dir.path()).unwrap();
    let state = AppState::new(storage, test_settings(&temp_dir)).unwrap();
    (Arc::new(state), temp_dir)
}
