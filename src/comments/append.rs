//! One append attempt as a typestate machine.
//!
//! Idle → Pulled → ConfigLoaded → Appended → (pushed comment)
//!
//! Each transition consumes `self`, so an attempt cannot commit before it has
//! pulled and loaded the namespace config. Conflict handling and the
//! reconcile guard live in [`super::store::CommentStore`].

use super::blocks::{BlockLayout, BlockTarget};
use super::error::StoreError;
use super::model::{Comment, CommentConfig, CommentId, NewComment, now_utc_string};
use super::serialize::{BlockPosition, comment_fragment};
use crate::git::{PullOutcome, Session};

/// Initial phase.
pub struct Idle;

/// Working tree matches the remote tip.
pub struct Pulled {
    pub pull: PullOutcome,
}

/// Config loaded (and rotated if needed); target block chosen.
pub struct ConfigLoaded {
    pub config: CommentConfig,
    pub target: BlockTarget,
    pub rotated: bool,
}

/// Record written and staged, not yet committed.
pub struct Appended {
    pub comment: Comment,
    pub block: u64,
}

pub struct AppendProcess<'a, S, Phase> {
    session: &'a mut S,
    layout: &'a BlockLayout,
    pub phase: Phase,
}

impl<'a, S: Session> AppendProcess<'a, S, Idle> {
    pub fn new(session: &'a mut S, layout: &'a BlockLayout) -> Self {
        AppendProcess {
            session,
            layout,
            phase: Idle,
        }
    }

    pub fn pull(self) -> Result<AppendProcess<'a, S, Pulled>, StoreError> {
        let pull = self.session.pull()?;
        Ok(AppendProcess {
            session: self.session,
            layout: self.layout,
            phase: Pulled { pull },
        })
    }
}

impl<'a, S: Session> AppendProcess<'a, S, Pulled> {
    /// Load or create the config and pick the block to write into.
    pub fn load(self) -> Result<AppendProcess<'a, S, ConfigLoaded>, StoreError> {
        let config = self.layout.get_or_init_config(self.session)?;
        let current = self.layout.current_block(self.session, &config)?;
        let (config, rotated) = self.layout.maybe_rotate(self.session, config, current.size)?;
        let target = if rotated {
            BlockTarget {
                index: config.last_block,
                path: self.layout.current_block_path(&config),
                size: 0,
            }
        } else {
            current
        };

        Ok(AppendProcess {
            session: self.session,
            layout: self.layout,
            phase: ConfigLoaded {
                config,
                target,
                rotated,
            },
        })
    }
}

impl<'a, S: Session> AppendProcess<'a, S, ConfigLoaded> {
    /// Stamp the comment and write it into the target block.
    pub fn append(self, new: &NewComment) -> Result<AppendProcess<'a, S, Appended>, StoreError> {
        let ConfigLoaded { config, target, .. } = self.phase;

        let id = CommentId::generate(&config.version, target.index);
        let comment = new.finalize(id, now_utc_string()?);
        let fragment = comment_fragment(&comment, BlockPosition::for_block_size(target.size))?;
        self.session
            .append_file(&target.path, &fragment.bytes, fragment.offset)?;
        tracing::debug!(
            comment_id = %comment.id,
            block = target.index,
            bytes = fragment.bytes.len(),
            "appended comment"
        );

        Ok(AppendProcess {
            session: self.session,
            layout: self.layout,
            phase: Appended {
                comment,
                block: target.index,
            },
        })
    }
}

impl<'a, S: Session> AppendProcess<'a, S, Appended> {
    /// Commit and push. Returns the finalized comment on success.
    pub fn push(self) -> Result<Comment, StoreError> {
        let message = commit_message(&self.phase.comment);
        self.session.commit_and_push(&message)?;
        Ok(self.phase.comment)
    }
}

pub fn commit_message(comment: &Comment) -> String {
    format!("Add comment: {}", comment.id)
}
