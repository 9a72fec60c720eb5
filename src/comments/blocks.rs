//! Block store: which file a comment goes into.
//!
//! Layout under the repository root:
//! - `<root>/<version>/config.json`: the [`CommentConfig`]
//! - `<root>/<version>/blocks/<N>.json`: one JSON array per block
//!
//! Rotation is decided from the size of the last block before an append, so a
//! block can overshoot the threshold by at most one record.

use std::path::{Path, PathBuf};

use super::error::StoreError;
use super::model::CommentConfig;
use crate::git::Session;

pub const DEFAULT_ROOT: &str = "data/comments";
pub const DEFAULT_SCHEMA_VERSION: &str = "v1";
pub const DEFAULT_ROTATE_BYTES: u64 = 128 * 1024;

/// The block a write will target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTarget {
    pub index: u64,
    pub path: PathBuf,
    /// Size observed before the write; 0 for a block that does not exist yet.
    pub size: u64,
}

/// Paths and rotation policy for one comment namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    namespace_dir: PathBuf,
    schema_version: String,
    rotate_bytes: u64,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT, DEFAULT_SCHEMA_VERSION, DEFAULT_ROTATE_BYTES)
    }
}

impl BlockLayout {
    pub fn new(
        root: impl AsRef<Path>,
        schema_version: impl Into<String>,
        rotate_bytes: u64,
    ) -> Self {
        let schema_version = schema_version.into();
        Self {
            namespace_dir: root.as_ref().join(&schema_version),
            schema_version,
            rotate_bytes,
        }
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn rotate_bytes(&self) -> u64 {
        self.rotate_bytes
    }

    pub fn config_path(&self) -> PathBuf {
        self.namespace_dir.join("config.json")
    }

    pub fn block_path(&self, index: u64) -> PathBuf {
        self.namespace_dir.join("blocks").join(format!("{index}.json"))
    }

    pub fn current_block_path(&self, config: &CommentConfig) -> PathBuf {
        self.block_path(config.last_block)
    }

    /// Read the namespace config, creating and staging the initial one if absent.
    pub fn get_or_init_config<S: Session>(
        &self,
        session: &mut S,
    ) -> Result<CommentConfig, StoreError> {
        let path = self.config_path();
        match session.read_file(&path) {
            Ok(bytes) => {
                let config: CommentConfig = serde_json::from_slice(&bytes)
                    .map_err(|source| StoreError::MalformedConfig {
                        path: path.clone(),
                        source,
                    })?;
                if !config.is_consistent() {
                    return Err(StoreError::InvalidConfig {
                        path,
                        first_block: config.first_block,
                        last_block: config.last_block,
                    });
                }
                Ok(config)
            }
            Err(e) if e.is_not_found() => {
                let config = CommentConfig::initial(self.schema_version.clone());
                tracing::info!(path = %path.display(), "initializing comment config");
                self.write_config(session, &config)?;
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn write_config<S: Session>(
        &self,
        session: &mut S,
        config: &CommentConfig,
    ) -> Result<(), StoreError> {
        session.write_file(&self.config_path(), &render_config(config)?)?;
        Ok(())
    }

    /// Size of the current last block; a missing block counts as empty.
    pub fn current_block<S: Session>(
        &self,
        session: &S,
        config: &CommentConfig,
    ) -> Result<BlockTarget, StoreError> {
        let path = self.current_block_path(config);
        let size = match session.stat_size(&path) {
            Ok(size) => size,
            Err(e) if e.is_not_found() => 0,
            Err(e) => return Err(e.into()),
        };
        Ok(BlockTarget {
            index: config.last_block,
            path,
            size,
        })
    }

    /// Advance to a fresh block when the current one is over the threshold.
    ///
    /// Returns the (possibly updated and persisted) config and whether the next
    /// write targets a new, empty block.
    pub fn maybe_rotate<S: Session>(
        &self,
        session: &mut S,
        mut config: CommentConfig,
        current_size: u64,
    ) -> Result<(CommentConfig, bool), StoreError> {
        if current_size <= self.rotate_bytes {
            return Ok((config, false));
        }
        config.last_block += 1;
        tracing::info!(
            block = config.last_block,
            previous_size = current_size,
            threshold = self.rotate_bytes,
            "rotating to a new block"
        );
        self.write_config(session, &config)?;
        Ok((config, true))
    }
}

/// Pretty-printed with two-space indent and a trailing newline.
pub fn render_config(config: &CommentConfig) -> Result<Vec<u8>, StoreError> {
    let mut bytes = serde_json::to_vec_pretty(config).map_err(|source| StoreError::Encode {
        field: "config",
        source,
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}
