//! # Paths
//!
//! Where Alfred keeps its own files: the app support directory, the local
//! `bin/` that installed tools land in, the config file and the debug log.

use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "Alfred";
pub const BIN_DIR: &str = "bin";
pub const CONFIG_FILE: &str = "config.yaml";
pub const LOG_FILE: &str = "alfred_debug.log";

/// `~/Library/Application Support/Alfred` on macOS, the XDG data dir elsewhere.
pub fn default_app_support_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn local_bin_dir(app_support: &Path) -> PathBuf {
    app_support.join(BIN_DIR)
}

pub fn config_file(app_support: &Path) -> PathBuf {
    app_support.join(CONFIG_FILE)
}

pub fn log_file(app_support: &Path) -> PathBuf {
    app_support.join(LOG_FILE)
}

/// File name as a display string, falling back to the whole path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
