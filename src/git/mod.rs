//! Git integration module.
//!
//! Provides:
//! - `Session`, the primitive file and remote operations the comment store runs on
//! - `GitSession`, the libgit2-backed implementation owning the single working tree
//! - Credential callbacks for basic-auth remotes

mod auth;
pub mod error;
pub mod session;

pub use auth::Credentials;
pub use error::{PushRejected, SessionError};
pub use session::{GitSession, PullOutcome, RemoteSettings, Session};
