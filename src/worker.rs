//! Comment worker: the single writer.
//!
//! Owns the [`CommentStore`] (and through it the repository clone) on a
//! dedicated thread. Requests arrive as [`WorkerOp`] messages and are handled
//! strictly one at a time, so at most one pull/append/commit/push sequence is
//! ever in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::comments::{Comment, CommentStore, NewComment, StoreError};
use crate::git::Session;

/// Operations sent from request handlers to the worker thread.
pub enum WorkerOp {
    AddComment {
        comment: NewComment,
        respond: Sender<Result<Comment, StoreError>>,
        /// Set by the caller once it stops waiting.
        abandoned: Arc<AtomicBool>,
    },

    /// Stop the loop after the current operation.
    Shutdown,
}

pub struct CommentWorker<S> {
    store: CommentStore<S>,
}

impl<S: Session> CommentWorker<S> {
    pub fn new(store: CommentStore<S>) -> Self {
        Self { store }
    }

    /// Process a single op; `false` ends the loop.
    fn handle_op(&mut self, op: WorkerOp) -> bool {
        match op {
            WorkerOp::AddComment {
                comment,
                respond,
                abandoned,
            } => {
                if abandoned.load(Ordering::Acquire) {
                    tracing::warn!(
                        author = %comment.author,
                        "skipping comment whose caller gave up waiting"
                    );
                    return true;
                }
                let result = self.store.add_comment(&comment);
                if let Err(err) = &result
                    && err.is_fatal()
                {
                    tracing::error!(error = %err, "comment store refuses further writes");
                }
                // The caller may have timed out and gone away.
                let _ = respond.send(result);
                true
            }
            WorkerOp::Shutdown => false,
        }
    }

    pub fn into_store(self) -> CommentStore<S> {
        self.store
    }
}

impl<S: Session + Send + 'static> CommentWorker<S> {
    /// Start the worker thread. Joining the thread hands the store back.
    pub fn spawn(
        store: CommentStore<S>,
    ) -> Result<(WorkerHandle, JoinHandle<CommentStore<S>>), StoreError> {
        let (tx, rx) = channel::unbounded();
        let worker = CommentWorker::new(store);
        let join = std::thread::Builder::new()
            .name("gitchat-worker".into())
            .spawn(move || run_comment_loop(worker, rx))
            .map_err(StoreError::WorkerSpawn)?;
        Ok((WorkerHandle { tx, timeout: None }, join))
    }
}

/// Run the worker loop until `Shutdown` or until every handle is dropped.
pub fn run_comment_loop<S: Session>(
    mut worker: CommentWorker<S>,
    rx: Receiver<WorkerOp>,
) -> CommentStore<S> {
    tracing::info!("comment worker started");
    for op in rx {
        if !worker.handle_op(op) {
            break;
        }
    }
    tracing::info!("comment worker stopped");
    worker.into_store()
}

/// Cheap, cloneable way to reach the worker from any thread.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: Sender<WorkerOp>,
    timeout: Option<Duration>,
}

impl WorkerHandle {
    /// Bound how long `add_comment` waits for its answer.
    ///
    /// A sequence already in flight when the timeout fires still finishes
    /// and cleans up. A request the worker has not started yet is dropped.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Queue a comment and block until the worker has stored it.
    pub fn add_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let (respond, response) = channel::bounded(1);
        let abandoned = Arc::new(AtomicBool::new(false));
        self.tx
            .send(WorkerOp::AddComment {
                comment,
                respond,
                abandoned: Arc::clone(&abandoned),
            })
            .map_err(|_| StoreError::WorkerGone)?;

        match self.timeout {
            Some(timeout) => match response.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => {
                    abandoned.store(true, Ordering::Release);
                    Err(StoreError::Timeout)
                }
                Err(RecvTimeoutError::Disconnected) => Err(StoreError::WorkerGone),
            },
            None => response.recv().map_err(|_| StoreError::WorkerGone)?,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(WorkerOp::Shutdown);
    }
}
