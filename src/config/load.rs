use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::merge::apply_env_overrides;
use super::Config;

pub const CONFIG_ENV: &str = "GITCHAT_CONFIG";

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

/// Explicit path first, then `GITCHAT_CONFIG`, then the user config dir.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(raw) = std::env::var(CONFIG_ENV)
        && !raw.trim().is_empty()
    {
        return PathBuf::from(raw);
    }
    config_path()
}

/// Load the effective config: file (if any), then environment overrides.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = load_from(&resolve_path(explicit))?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse one config file. A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;
    let contents = toml::to_string_pretty(cfg)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(contents.as_bytes()).map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
