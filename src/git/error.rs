//! Git session error types.

use std::path::PathBuf;

use git2::Oid;
use thiserror::Error;

use crate::error::{Effect, Transience};

/// Errors from the repository and working-tree primitives.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    #[error("failed to clone {url}: {source}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to open repository at {0}: {1}")]
    OpenRepo(PathBuf, #[source] git2::Error),

    #[error("remote has no commits; push an initial commit first")]
    EmptyRemote,

    #[error("failed to fetch from remote: {0}")]
    Fetch(#[source] git2::Error),

    #[error("remote ref not found: {0}")]
    NoRemoteRef(String),

    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("append offset must not be positive, got {0}")]
    InvalidOffset(i64),

    #[error("failed to stage {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("failed to create commit: {0}")]
    Commit(#[source] git2::Error),

    #[error("push rejected (non-fast-forward)")]
    NonFastForward,

    #[error("failed to push: {0}")]
    Push(#[source] git2::Error),

    #[error(transparent)]
    PushRejected(#[from] PushRejected),

    #[error("failed to reset working tree to {target}: {source}")]
    Reset {
        target: Oid,
        #[source]
        source: git2::Error,
    },

    /// A conflict was flagged but HEAD never moved past the pre-commit hash.
    #[error("push conflict flagged but HEAD {head} equals the pre-attempt commit")]
    Inconsistent { head: Oid },

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, SessionError::NonFastForward)
    }

    pub fn is_inconsistent(&self) -> bool {
        matches!(self, SessionError::Inconsistent { .. })
    }

    /// Whether retrying may succeed.
    pub fn transience(&self) -> Transience {
        match self {
            SessionError::Clone { .. }
            | SessionError::Fetch(_)
            | SessionError::NonFastForward
            | SessionError::Push(_)
            | SessionError::PushRejected(_) => Transience::Retryable,

            SessionError::Io { .. } | SessionError::Git(_) => Transience::Unknown,

            SessionError::OpenRepo(_, _)
            | SessionError::EmptyRemote
            | SessionError::NoRemoteRef(_)
            | SessionError::NotFound(_)
            | SessionError::InvalidOffset(_)
            | SessionError::Stage { .. }
            | SessionError::Commit(_)
            | SessionError::Reset { .. }
            | SessionError::Inconsistent { .. } => Transience::Permanent,
        }
    }

    /// What we know about side effects when this error is returned.
    pub fn effect(&self) -> Effect {
        match self {
            // Push-phase errors occur after a local commit was created.
            SessionError::NonFastForward
            | SessionError::Push(_)
            | SessionError::PushRejected(_)
            | SessionError::Reset { .. } => Effect::Some,

            SessionError::Inconsistent { .. } | SessionError::Git(_) | SessionError::Io { .. } => {
                Effect::Unknown
            }

            _ => Effect::None,
        }
    }
}

/// Push was rejected by the remote with a status message.
#[derive(Error, Debug)]
#[error("push rejected: {message}")]
pub struct PushRejected {
    pub message: String,
}

/// Whether a push failure message describes a diverged remote.
pub(crate) fn is_non_fast_forward(message: &str) -> bool {
    message.contains("non-fast-forward")
        || message.contains("non-fastforward")
        || message.contains("fetch first")
}
