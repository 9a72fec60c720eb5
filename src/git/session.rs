//! Remote session: the single clone of the comment remote.
//!
//! The session owns the repository handle, the working tree on disk and the
//! push-conflict bookkeeping. Every other component reaches the repository
//! through the [`Session`] primitives:
//! - file primitives (`read_file`, `write_file`, `append_file`, `stat_size`) stage
//!   what they write
//! - `pull` force fast-forwards to the remote tip
//! - `commit_and_push` remembers the pre-commit HEAD and flags non-fast-forward
//!   rejections
//! - `reconcile` restores a clean tree after every attempt

use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    ErrorCode, FetchOptions, Oid, PushOptions, Repository, ResetType, Signature, Status,
    StatusOptions,
};
use tempfile::TempDir;

use super::auth::Credentials;
use super::error::{PushRejected, SessionError, is_non_fast_forward};

const REMOTE_NAME: &str = "origin";

/// Primitive repository operations the comment store is written against.
pub trait Session {
    /// Force fast-forward the working tree to the remote tip.
    fn pull(&mut self) -> Result<PullOutcome, SessionError>;

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, SessionError>;

    /// Truncate-and-replace `path`, then stage it.
    fn write_file(&mut self, path: &Path, data: &[u8]) -> Result<(), SessionError>;

    /// Open-or-create `path`, seek `offset` bytes back from its end, write, stage.
    ///
    /// `offset` must be zero or negative.
    fn append_file(&mut self, path: &Path, data: &[u8], offset: i64) -> Result<(), SessionError>;

    fn stat_size(&self, path: &Path) -> Result<u64, SessionError>;

    /// Commit staged changes on top of HEAD and push them.
    ///
    /// Returns `SessionError::NonFastForward` when the remote diverged.
    fn commit_and_push(&mut self, message: &str) -> Result<Oid, SessionError>;

    /// Post-attempt consistency guard.
    ///
    /// Rolls back to the pre-attempt HEAD after a flagged conflict and discards
    /// any uncommitted or untracked changes. Returns
    /// `SessionError::Inconsistent` when a conflict was flagged but HEAD never
    /// moved.
    fn reconcile(&mut self) -> Result<(), SessionError>;
}

/// Result of a pull.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullOutcome {
    UpToDate,
    FastForwarded { from: Oid, to: Oid },
}

/// Where and how to reach the comment remote.
#[derive(Clone, Debug)]
pub struct RemoteSettings {
    pub url: String,
    /// Branch to track; the remote's default branch when `None`.
    pub branch: Option<String>,
    pub credentials: Credentials,
    pub author_name: String,
    pub author_email: String,
    /// Clone location; a temporary directory when `None`.
    pub workdir: Option<PathBuf>,
}

/// libgit2-backed [`Session`].
pub struct GitSession {
    repo: Repository,
    workdir: PathBuf,
    branch: String,
    credentials: Credentials,
    author_name: String,
    author_email: String,
    /// HEAD recorded right before the last commit.
    previous_head: Option<Oid>,
    /// Set when the last push was rejected as non-fast-forward.
    conflict: bool,
    _tempdir: Option<TempDir>,
}

impl GitSession {
    /// Clone the remote and take ownership of the working tree.
    ///
    /// An existing clone at the configured workdir is reopened and cleaned
    /// instead of cloned again.
    pub fn clone_remote(settings: &RemoteSettings) -> Result<Self, SessionError> {
        let (workdir, tempdir) = match &settings.workdir {
            Some(dir) => (dir.clone(), None),
            None => {
                let tempdir = tempfile::Builder::new()
                    .prefix("gitchat-")
                    .tempdir()
                    .map_err(|source| SessionError::Io {
                        path: std::env::temp_dir(),
                        source,
                    })?;
                (tempdir.path().to_owned(), Some(tempdir))
            }
        };

        let repo = if workdir.join(".git").exists() {
            tracing::info!(workdir = %workdir.display(), "reusing existing clone");
            Repository::open(&workdir).map_err(|e| SessionError::OpenRepo(workdir.clone(), e))?
        } else {
            tracing::info!(url = %settings.url, workdir = %workdir.display(), "cloning comment remote");
            let mut fetch = FetchOptions::new();
            fetch.remote_callbacks(settings.credentials.remote_callbacks());
            let mut builder = RepoBuilder::new();
            builder.fetch_options(fetch);
            if let Some(branch) = settings.branch.as_deref() {
                builder.branch(branch);
            }
            builder
                .clone(&settings.url, &workdir)
                .map_err(|source| SessionError::Clone {
                    url: settings.url.clone(),
                    source,
                })?
        };

        let branch = match repo.head() {
            Ok(head) => head
                .shorthand()
                .map(str::to_owned)
                .ok_or_else(|| git2::Error::from_str("HEAD is not a valid utf-8 branch"))?,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Err(SessionError::EmptyRemote),
            Err(e) => return Err(e.into()),
        };

        let mut session = GitSession {
            repo,
            workdir,
            branch,
            credentials: settings.credentials.clone(),
            author_name: settings.author_name.clone(),
            author_email: settings.author_email.clone(),
            previous_head: None,
            conflict: false,
            _tempdir: tempdir,
        };
        session.discard_local_changes()?;
        tracing::info!(branch = %session.branch, head = %session.head()?, "remote session ready");
        Ok(session)
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn head(&self) -> Result<Oid, SessionError> {
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }

    pub fn has_conflict(&self) -> bool {
        self.conflict
    }

    fn abs(&self, rel: &Path) -> PathBuf {
        self.workdir.join(rel)
    }

    fn stage(&self, rel: &Path) -> Result<(), SessionError> {
        let mut index = self.repo.index()?;
        index.add_path(rel).map_err(|source| SessionError::Stage {
            path: rel.to_owned(),
            source,
        })?;
        index.write().map_err(|source| SessionError::Stage {
            path: rel.to_owned(),
            source,
        })?;
        Ok(())
    }

    fn reset_hard(&self, target: Oid) -> Result<(), SessionError> {
        let commit = self
            .repo
            .find_commit(target)
            .map_err(|source| SessionError::Reset { target, source })?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo
            .reset(commit.as_object(), ResetType::Hard, Some(&mut checkout))
            .map_err(|source| SessionError::Reset { target, source })
    }

    fn dirty_paths(&self) -> Result<Vec<(PathBuf, Status)>, SessionError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(false)
            .include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .filter_map(|entry| entry.path().map(|p| (PathBuf::from(p), entry.status())))
            .collect())
    }

    /// Hard reset to HEAD and delete untracked files.
    fn discard_local_changes(&mut self) -> Result<(), SessionError> {
        if self.dirty_paths()?.is_empty() {
            return Ok(());
        }
        let head = self.head()?;
        tracing::warn!(head = %head, "discarding uncommitted changes");
        self.reset_hard(head)?;

        for (rel, status) in self.dirty_paths()? {
            if !status.contains(Status::WT_NEW) {
                continue;
            }
            let path = self.abs(&rel);
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.map_err(|source| SessionError::Io { path, source })?;
        }
        Ok(())
    }

    fn push(&self) -> Result<(), SessionError> {
        let mut remote = self.repo.find_remote(REMOTE_NAME)?;
        let refspec = format!("refs/heads/{0}:refs/heads/{0}", self.branch);
        let push_error: RefCell<Option<String>> = RefCell::new(None);

        {
            let mut callbacks = self.credentials.remote_callbacks();
            callbacks.push_update_reference(|_ref_name, status| {
                if let Some(msg) = status {
                    *push_error.borrow_mut() = Some(msg.to_string());
                }
                Ok(())
            });
            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);

            if let Err(e) = remote.push(&[refspec.as_str()], Some(&mut push_options)) {
                if e.code() == ErrorCode::NotFastForward || is_non_fast_forward(e.message()) {
                    return Err(SessionError::NonFastForward);
                }
                return Err(SessionError::Push(e));
            }
        }

        if let Some(message) = push_error.into_inner() {
            if is_non_fast_forward(&message) {
                return Err(SessionError::NonFastForward);
            }
            return Err(PushRejected { message }.into());
        }
        Ok(())
    }
}

impl Session for GitSession {
    fn pull(&mut self) -> Result<PullOutcome, SessionError> {
        let mut remote = self.repo.find_remote(REMOTE_NAME)?;
        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(self.credentials.remote_callbacks());
        let refspec = format!("+refs/heads/{0}:refs/remotes/{1}/{0}", self.branch, REMOTE_NAME);
        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch), None)
            .map_err(SessionError::Fetch)?;

        let remote_ref = format!("refs/remotes/{}/{}", REMOTE_NAME, self.branch);
        let target = self
            .repo
            .refname_to_id(&remote_ref)
            .map_err(|_| SessionError::NoRemoteRef(remote_ref))?;
        let head = self.head()?;
        if head == target {
            tracing::debug!(head = %head, "already up to date");
            return Ok(PullOutcome::UpToDate);
        }

        self.reset_hard(target)?;
        tracing::debug!(from = %head, to = %target, "fast-forwarded to remote tip");
        Ok(PullOutcome::FastForwarded {
            from: head,
            to: target,
        })
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, SessionError> {
        let abs = self.abs(path);
        fs::read(&abs).map_err(|source| io_error(path, source))
    }

    fn write_file(&mut self, path: &Path, data: &[u8]) -> Result<(), SessionError> {
        let abs = self.abs(path);
        ensure_parent(&abs)?;
        fs::write(&abs, data).map_err(|source| io_error(path, source))?;
        self.stage(path)
    }

    fn append_file(&mut self, path: &Path, data: &[u8], offset: i64) -> Result<(), SessionError> {
        if offset > 0 {
            return Err(SessionError::InvalidOffset(offset));
        }
        let abs = self.abs(path);
        ensure_parent(&abs)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&abs)
            .map_err(|source| io_error(path, source))?;
        file.seek(SeekFrom::End(offset))
            .map_err(|source| io_error(path, source))?;
        file.write_all(data)
            .and_then(|()| file.sync_data())
            .map_err(|source| io_error(path, source))?;
        drop(file);
        self.stage(path)
    }

    fn stat_size(&self, path: &Path) -> Result<u64, SessionError> {
        let abs = self.abs(path);
        fs::metadata(&abs)
            .map(|meta| meta.len())
            .map_err(|source| io_error(path, source))
    }

    fn commit_and_push(&mut self, message: &str) -> Result<Oid, SessionError> {
        let parent = self.repo.head()?.peel_to_commit()?;
        self.previous_head = Some(parent.id());

        let tree_oid = self.repo.index()?.write_tree().map_err(SessionError::Commit)?;
        let tree = self.repo.find_tree(tree_oid)?;
        let sig = Signature::now(&self.author_name, &self.author_email)?;
        let commit_oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
            .map_err(SessionError::Commit)?;
        tracing::debug!(commit = %commit_oid, parent = %parent.id(), "created commit");

        match self.push() {
            Ok(()) => {
                tracing::info!(commit = %commit_oid, branch = %self.branch, "pushed");
                Ok(commit_oid)
            }
            Err(SessionError::NonFastForward) => {
                tracing::warn!(commit = %commit_oid, "push rejected, remote has diverged");
                self.conflict = true;
                Err(SessionError::NonFastForward)
            }
            Err(e) => Err(e),
        }
    }

    fn reconcile(&mut self) -> Result<(), SessionError> {
        // One rollback per commit, whether or not it succeeds.
        let previous_head = self.previous_head.take();
        if std::mem::take(&mut self.conflict) {
            let head = self.head()?;
            let previous = match previous_head {
                Some(previous) if previous != head => previous,
                _ => {
                    tracing::error!(head = %head, "conflict flagged but HEAD did not move");
                    return Err(SessionError::Inconsistent { head });
                }
            };
            tracing::info!(from = %head, to = %previous, "rolling back rejected commit");
            self.reset_hard(previous)?;
        }
        self.discard_local_changes()
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SessionError {
    if source.kind() == std::io::ErrorKind::NotFound {
        SessionError::NotFound(path.to_owned())
    } else {
        SessionError::Io {
            path: path.to_owned(),
            source,
        }
    }
}

fn ensure_parent(abs: &Path) -> Result<(), SessionError> {
    if let Some(dir) = abs.parent() {
        fs::create_dir_all(dir).map_err(|source| SessionError::Io {
            path: dir.to_owned(),
            source,
        })?;
    }
    Ok(())
}
