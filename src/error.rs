use thiserror::Error;

use crate::comments::StoreError;
use crate::config::ConfigError;
use crate::git::SessionError;
use crate::http::ServerError;
use crate::validate::ValidationError;

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
    /// Unknown if retry will help.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// What we know about side effects when an error is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Definitely no side effects occurred.
    None,
    /// Side effects definitely occurred (locally or remotely).
    Some,
    /// We don't know if side effects occurred.
    Unknown,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Some => "some",
            Effect::Unknown => "unknown",
        }
    }
}

/// Crate-level convenience error.
///
/// A thin wrapper over the per-capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Session(e) => e.transience(),
            Error::Store(e) => e.transience(),
            Error::Validation(_) | Error::Config(_) => Transience::Permanent,
            Error::Server(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::Session(e) => e.effect(),
            Error::Store(e) => e.effect(),
            Error::Validation(_) | Error::Config(_) => Effect::None,
            Error::Server(_) => Effect::Unknown,
        }
    }
}
