//! Connection settings, persisted as JSON in the config dir. The auth token lives
//! in a separate credentials file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatcher::Timeouts;
use crate::persist::{atomic_write, read_json, write_json, PersistError};

const SETTINGS_VERSION: u32 = 1;

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

/// Connection settings stored in the OS config directory.
///
/// The `auth_token` field is never written to `settings.json`. It lives in a
/// separate credentials file handled by [`load_auth_token`]/[`save_auth_token`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub version: u32,
    #[serde(default)]
    pub server_address: String,
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
    /// Player uid appended as `@uid` to every command. Empty = no suffix.
    #[serde(default)]
    pub uid: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Command catalog file. None = built-in catalog.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            server_address: String::new(),
            auth_token: None,
            uid: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            catalog_path: None,
        }
    }
}

impl ClientSettings {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts::new(
            Duration::from_secs(self.connect_timeout_secs),
            Duration::from_secs(self.request_timeout_secs),
        )
    }

    pub fn token(&self) -> &str {
        self.auth_token.as_deref().unwrap_or_default()
    }

    /// Token for display: everything but the last four characters replaced by `*`.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token().chars().collect();
        let visible = chars.len().saturating_sub(4);
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < visible { '*' } else { *c })
            .collect()
    }
}

pub fn load_auth_token(app_config_dir: &Path) -> Option<String> {
    std::fs::read_to_string(crate::paths::credentials_path(app_config_dir))
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Store the token in the credentials file. An empty token deletes the file.
pub fn save_auth_token(app_config_dir: &Path, token: &str) -> Result<(), PersistError> {
    std::fs::create_dir_all(app_config_dir)?;
    let path = crate::paths::credentials_path(app_config_dir);
    if token.is_empty() {
        let _ = std::fs::remove_file(&path);
    } else {
        atomic_write(&path, token.as_bytes())?;
    }
    Ok(())
}

/// Load settings plus the stored token. A missing settings file gives defaults;
/// an unreadable one is reported and replaced by defaults.
pub fn load_settings(app_config_dir: &Path) -> ClientSettings {
    let path = crate::paths::settings_path(app_config_dir);
    let mut settings = if path.exists() {
        read_json::<ClientSettings>(&path).unwrap_or_else(|e| {
            eprintln!("[NbCommand] Ignoring unreadable settings {}: {e}", path.display());
            ClientSettings::default()
        })
    } else {
        ClientSettings::default()
    };
    settings.auth_token = load_auth_token(app_config_dir);
    settings
}

/// Save settings and the token (token goes to the credentials file).
pub fn save_settings(app_config_dir: &Path, settings: &ClientSettings) -> Result<(), PersistError> {
    std::fs::create_dir_all(app_config_dir)?;
    write_json(&crate::paths::settings_path(app_config_dir), settings)?;
    save_auth_token(app_config_dir, settings.token())
}
