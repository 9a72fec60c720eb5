//! XDG directory helpers for config and log locations.

use std::path::PathBuf;

const APP_DIR: &str = "gitchat";

/// Base directory for configuration files.
///
/// `$XDG_CONFIG_HOME/gitchat`, falling back to `~/.config/gitchat`.
pub(crate) fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| home().join(".config"))
        .join(APP_DIR)
}

/// Default directory for rolling log files.
///
/// `$XDG_STATE_HOME/gitchat/logs`, falling back to `~/.local/state/gitchat/logs`.
pub(crate) fn log_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::state_dir)
        .unwrap_or_else(|| home().join(".local").join("state"))
        .join(APP_DIR)
        .join("logs")
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}
