//! Comment store error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};
use crate::git::SessionError;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("malformed comment config at {path}: {source}")]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent comment config at {path}: firstBlock={first_block} lastBlock={last_block}")]
    InvalidConfig {
        path: PathBuf,
        first_block: u64,
        last_block: u64,
    },

    #[error("failed to encode field {field}: {source}")]
    Encode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error("push still conflicting after {attempts} attempts")]
    ConflictRetriesExhausted { attempts: usize },

    /// An unrecoverable inconsistency was seen earlier; writes stay refused.
    #[error("comment store halted after an unrecoverable inconsistency")]
    Halted,

    #[error("timed out waiting for the comment worker")]
    Timeout,

    #[error("comment worker is not running")]
    WorkerGone,

    #[error("failed to start comment worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

impl StoreError {
    /// True for conditions that must stop the process from taking writes.
    pub fn is_fatal(&self) -> bool {
        match self {
            StoreError::Halted => true,
            StoreError::Session(e) => e.is_inconsistent(),
            _ => false,
        }
    }

    pub fn transience(&self) -> Transience {
        match self {
            StoreError::Session(e) => e.transience(),
            StoreError::ConflictRetriesExhausted { .. } | StoreError::Timeout => {
                Transience::Retryable
            }
            StoreError::WorkerGone | StoreError::WorkerSpawn(_) => Transience::Unknown,
            StoreError::MalformedConfig { .. }
            | StoreError::InvalidConfig { .. }
            | StoreError::Encode { .. }
            | StoreError::Timestamp(_)
            | StoreError::Halted => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            StoreError::Session(e) => e.effect(),
            // Rejected commits were rolled back before the error surfaced.
            StoreError::ConflictRetriesExhausted { .. } | StoreError::Halted => Effect::None,
            // The worker keeps running the sequence after the caller stops waiting.
            StoreError::Timeout | StoreError::WorkerGone => Effect::Unknown,
            _ => Effect::None,
        }
    }
}
