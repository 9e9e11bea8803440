use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::persist::{read_json, write_json, PersistError};

/// Application-level settings stored in the OS config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub version: u32,
    /// Directory holding the catalog and stack XML documents.
    pub data_dir: PathBuf,
}

const SETTINGS_VERSION: u32 = 1;

impl AppSettings {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            version: SETTINGS_VERSION,
            data_dir,
        }
    }
}

/// Load settings from the app config directory. Returns None if no settings
/// file exists, if it fails to parse, or if it was written by a newer version.
pub fn load_settings(app_config_dir: &Path) -> Option<AppSettings> {
    let path = crate::paths::settings_path(app_config_dir);
    if !path.exists() {
        return None;
    }
    let settings = read_json::<AppSettings>(&path).ok()?;
    if settings.version > SETTINGS_VERSION {
        eprintln!(
            "[Stackdeck] settings version {} is newer than supported version {SETTINGS_VERSION}",
            settings.version
        );
        return None;
    }
    Some(settings)
}

/// Save settings to the app config directory.
pub fn save_settings(app_config_dir: &Path, settings: &AppSettings) -> Result<(), PersistError> {
    std::fs::create_dir_all(app_config_dir)?;
    write_json(&crate::paths::settings_path(app_config_dir), settings)
}
