//! Centralized path definitions for config files.
//!
//! Functions take the config directory explicitly so tests can point them at a
//! temp dir.

use std::path::{Path, PathBuf};

pub const APP_ID: &str = "com.nebula.nbcommand";

pub const SETTINGS_FILE: &str = "settings.json";
pub const CREDENTIALS_FILE: &str = ".credentials";
pub const CATALOG_FILE: &str = "commands.json";

pub fn settings_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(SETTINGS_FILE)
}

pub fn credentials_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(CREDENTIALS_FILE)
}

/// Default location of a user command catalog.
pub fn catalog_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(CATALOG_FILE)
}

/// The default user catalog, if one has been placed in the config dir.
pub fn user_catalog(app_config_dir: &Path) -> Option<PathBuf> {
    Some(catalog_path(app_config_dir)).filter(|p| p.is_file())
}

/// `<os config dir>/com.nebula.nbcommand`.
pub fn app_config_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var("APPDATA").map_or_else(|_| home_dir().join("AppData").join("Roaming"), PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home_dir().join("Library/Application Support")
    } else {
        std::env::var("XDG_CONFIG_HOME").map_or_else(|_| home_dir().join(".config"), PathBuf::from)
    };
    base.join(APP_ID)
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn user_catalog_only_when_present() {
        let dir = std::env::temp_dir().join("nb_command_test_user_catalog");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        assert_eq!(user_catalog(&dir), None);

        std::fs::write(catalog_path(&dir), r#"{ "commands": [] }"#).unwrap();
        assert_eq!(user_catalog(&dir), Some(dir.join("commands.json")));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
