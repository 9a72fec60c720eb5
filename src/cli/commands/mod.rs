pub(super) mod add;
pub(super) mod config;
pub(super) mod serve;

use crate::Result;
use crate::comments::CommentStore;
use crate::config::Config;
use crate::git::GitSession;

/// Validate the config and clone the remote.
fn open_store(config: &Config) -> Result<CommentStore<GitSession>> {
    config.validate()?;
    let session = GitSession::clone_remote(&config.remote.settings())?;
    tracing::info!(
        workdir = %session.workdir().display(),
        branch = session.branch(),
        "remote cloned"
    );
    Ok(CommentStore::new(session, config.comments.layout()))
}
