//! Comment storage engine.
//!
//! Provides:
//! - Data model (`Comment`, `NewComment`, `CommentConfig`, `CommentId`)
//! - Block store (config record, block paths, size-based rotation)
//! - Incremental JSON array serializer
//! - Append typestate machine (Idle → Pulled → ConfigLoaded → Appended)
//! - `CommentStore`, the retrying controller with the reconcile guard

pub mod append;
pub mod blocks;
pub mod error;
pub mod model;
pub mod serialize;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use blocks::{BlockLayout, BlockTarget, render_config};
pub use error::StoreError;
pub use model::{Comment, CommentConfig, CommentId, DATE_FORMAT, NewComment};
pub use serialize::{APPEND_OFFSET, BlockPosition, Fragment, comment_fragment};
pub use store::{CommentStore, MAX_PUSH_RETRIES};
