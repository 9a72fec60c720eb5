#![forbid(unsafe_code)]

pub mod cli;
pub mod comments;
pub mod config;
pub mod error;
pub mod git;
pub mod http;
mod paths;
pub mod telemetry;
pub mod validate;
pub mod worker;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

pub use crate::comments::{
    BlockLayout, Comment, CommentConfig, CommentId, CommentStore, NewComment, StoreError,
};
pub use crate::git::{GitSession, Session, SessionError};
pub use crate::worker::{CommentWorker, WorkerHandle};
