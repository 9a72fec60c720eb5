use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::comments::BlockLayout;
use crate::comments::blocks::{DEFAULT_ROOT, DEFAULT_ROTATE_BYTES, DEFAULT_SCHEMA_VERSION};
use crate::git::{Credentials, RemoteSettings};

pub const DEFAULT_AUTHOR_NAME: &str = "commentator";
pub const DEFAULT_AUTHOR_EMAIL: &str = "commentator@example.com";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3333";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub comments: CommentsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject settings no session or store can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "remote.url",
                reason: "must not be empty".into(),
            });
        }
        if self.comments.block_rotate_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "comments.block_rotate_bytes",
                reason: "must be greater than zero".into(),
            });
        }
        if self.comments.schema_version.trim().is_empty()
            || self.comments.schema_version.contains('/')
        {
            return Err(ConfigError::Invalid {
                field: "comments.schema_version",
                reason: format!("`{}` is not a usable version", self.comments.schema_version),
            });
        }
        Ok(())
    }

    /// Copy safe to print: the password is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.remote.password.is_some() {
            copy.remote.password = Some("********".into());
        }
        copy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: String,
    pub branch: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub author_name: String,
    pub author_email: String,
    pub workdir: Option<PathBuf>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            branch: None,
            username: None,
            password: None,
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
            workdir: None,
        }
    }
}

impl RemoteConfig {
    pub fn settings(&self) -> RemoteSettings {
        RemoteSettings {
            url: self.url.clone(),
            branch: self.branch.clone(),
            credentials: Credentials::new(self.username.clone(), self.password.clone()),
            author_name: self.author_name.clone(),
            author_email: self.author_email.clone(),
            workdir: self.workdir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub root: PathBuf,
    pub schema_version: String,
    pub block_rotate_bytes: u64,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            block_rotate_bytes: DEFAULT_ROTATE_BYTES,
        }
    }
}

impl CommentsConfig {
    pub fn layout(&self) -> BlockLayout {
        BlockLayout::new(&self.root, self.schema_version.clone(), self.block_rotate_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// How long a request waits for its comment before answering with an error.
    pub request_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            request_timeout_ms: None,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub stdout_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_format: LogFormat::Compact,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
    pub retention_max_files: Option<usize>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
            retention_max_files: Some(10),
        }
    }
}
