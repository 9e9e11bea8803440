//! Centralized path definitions for all data files.
//!
//! This module is the single source of truth for leaf filenames and
//! path-building functions. No other module should hard-code these strings.
//!
//! Functions accept `&Path` so they work in both library and CLI contexts.

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_ID: &str = "com.stackdeck.app";

// ── Leaf filenames ───────────────────────────────────────────────

pub const SETTINGS_FILE: &str = "settings.json";
pub const CATALOG_FILE: &str = "functions_config.xml";
pub const STACKS_FILE: &str = "saved_stacks.xml";

// ── Config-dir functions (take app_config_dir) ───────────────────

pub fn settings_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(SETTINGS_FILE)
}

// ── Data-dir functions (take data_dir) ───────────────────────────

pub fn catalog_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CATALOG_FILE)
}

pub fn stacks_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STACKS_FILE)
}
