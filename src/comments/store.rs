//! Concurrency controller for comment appends.
//!
//! Optimistic concurrency against the shared remote:
//! - every attempt pulls right before appending, then commits and pushes
//! - a non-fast-forward rejection rolls the tree back and retries once
//! - the reconcile guard runs after every attempt, whatever its outcome
//! - an unrecoverable inconsistency halts the store for the process lifetime

use super::append::AppendProcess;
use super::blocks::BlockLayout;
use super::error::StoreError;
use super::model::{Comment, NewComment};
use crate::git::{Session, SessionError};

/// Retries after the first conflicting push.
pub const MAX_PUSH_RETRIES: usize = 1;

pub struct CommentStore<S> {
    session: S,
    layout: BlockLayout,
    halted: bool,
}

impl<S: Session> CommentStore<S> {
    pub fn new(session: S, layout: BlockLayout) -> Self {
        Self {
            session,
            layout,
            halted: false,
        }
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Append one comment, returning it with its id and date assigned.
    pub fn add_comment(&mut self, new: &NewComment) -> Result<Comment, StoreError> {
        if self.halted {
            return Err(StoreError::Halted);
        }

        for attempt in 0..=MAX_PUSH_RETRIES {
            let span = tracing::info_span!("add_comment", attempt);
            let _enter = span.enter();

            let outcome = AppendProcess::new(&mut self.session, &self.layout)
                .pull()
                .and_then(|p| p.load())
                .and_then(|p| p.append(new))
                .and_then(|p| p.push());

            if let Err(guard_err) = self.session.reconcile() {
                if guard_err.is_inconsistent() {
                    self.halted = true;
                    tracing::error!(error = %guard_err, "halting comment store");
                    return Err(guard_err.into());
                }
                match outcome {
                    Ok(comment) => {
                        tracing::warn!(
                            comment_id = %comment.id,
                            error = %guard_err,
                            "comment pushed but working tree cleanup failed"
                        );
                        return Ok(comment);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "attempt failed");
                        return Err(guard_err.into());
                    }
                }
            }

            match outcome {
                Ok(comment) => {
                    tracing::info!(comment_id = %comment.id, "comment stored");
                    return Ok(comment);
                }
                Err(StoreError::Session(SessionError::NonFastForward)) if attempt < MAX_PUSH_RETRIES => {
                    tracing::info!("push conflict, retrying from pull");
                }
                Err(StoreError::Session(SessionError::NonFastForward)) => {
                    tracing::warn!("push conflict persisted, giving up");
                }
                Err(err) => return Err(err),
            }
        }

        Err(StoreError::ConflictRetriesExhausted {
            attempts: MAX_PUSH_RETRIES + 1,
        })
    }

    /// Give the session back, e.g. for inspection after shutdown.
    pub fn into_session(self) -> S {
        self.session
    }
}
