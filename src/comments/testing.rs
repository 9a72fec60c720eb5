//! In-memory `Session` with scripted push outcomes.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use git2::Oid;

use crate::git::{PullOutcome, Session, SessionError};

type Files = BTreeMap<PathBuf, Vec<u8>>;

#[derive(Clone, Copy, Debug)]
pub(crate) enum PushScript {
    Accept,
    Conflict,
    Fail,
}

pub(crate) struct MemSession {
    /// Remote history, tip last.
    pub remote: Vec<Files>,
    /// Local history, HEAD last.
    pub commits: Vec<Files>,
    pub working: Files,
    /// Consumed one per push; empty means accept.
    pub pushes: VecDeque<PushScript>,
    /// Commits do not advance HEAD.
    pub head_sticks: bool,
    pub fail_appends: bool,
    pub fail_pulls: bool,
    pub pulls: usize,
    pub reconciles: usize,
    /// Local HEAD on entry to each pull.
    pub pulled_from: Vec<usize>,
    /// Local HEAD on entry to each commit.
    pub committed_on: Vec<usize>,
    previous_head: Option<usize>,
    conflict: bool,
}

impl MemSession {
    pub fn new() -> Self {
        Self {
            remote: vec![Files::new()],
            commits: vec![Files::new()],
            working: Files::new(),
            pushes: VecDeque::new(),
            head_sticks: false,
            fail_appends: false,
            fail_pulls: false,
            pulls: 0,
            reconciles: 0,
            pulled_from: Vec::new(),
            committed_on: Vec::new(),
            previous_head: None,
            conflict: false,
        }
    }

    pub fn scripted(pushes: impl IntoIterator<Item = PushScript>) -> Self {
        let mut session = Self::new();
        session.pushes = pushes.into_iter().collect();
        session
    }

    pub fn remote_file(&self, path: impl AsRef<Path>) -> Option<&Vec<u8>> {
        self.remote.last().and_then(|tip| tip.get(path.as_ref()))
    }

    /// Simulate another writer pushing `path` to the remote.
    pub fn push_elsewhere(&mut self, path: impl AsRef<Path>, data: &[u8]) {
        let mut tip = self.remote.last().cloned().unwrap_or_default();
        tip.insert(path.as_ref().to_owned(), data.to_vec());
        self.remote.push(tip);
    }

    fn head(&self) -> usize {
        self.commits.len() - 1
    }

    fn head_files(&self) -> &Files {
        &self.commits[self.head()]
    }
}

pub(crate) fn oid(n: usize) -> Oid {
    let mut bytes = [0u8; 20];
    bytes[12..].copy_from_slice(&(n as u64 + 1).to_be_bytes());
    Oid::from_bytes(&bytes).expect("20 byte oid")
}

impl Session for MemSession {
    fn pull(&mut self) -> Result<PullOutcome, SessionError> {
        self.pulls += 1;
        self.pulled_from.push(self.head());
        if self.fail_pulls {
            return Err(SessionError::Fetch(git2::Error::from_str("remote unreachable")));
        }
        let tip = self.remote.last().cloned().unwrap_or_default();
        if &tip == self.head_files() && tip == self.working {
            return Ok(PullOutcome::UpToDate);
        }
        let from = oid(self.head());
        self.commits.push(tip.clone());
        self.working = tip;
        Ok(PullOutcome::FastForwarded {
            from,
            to: oid(self.head()),
        })
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, SessionError> {
        self.working
            .get(path)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(path.to_owned()))
    }

    fn write_file(&mut self, path: &Path, data: &[u8]) -> Result<(), SessionError> {
        self.working.insert(path.to_owned(), data.to_vec());
        Ok(())
    }

    fn append_file(&mut self, path: &Path, data: &[u8], offset: i64) -> Result<(), SessionError> {
        if self.fail_appends {
            return Err(SessionError::Io {
                path: path.to_owned(),
                source: std::io::Error::other("disk full"),
            });
        }
        if offset > 0 {
            return Err(SessionError::InvalidOffset(offset));
        }
        let file = self.working.entry(path.to_owned()).or_default();
        let at = file.len() as i64 + offset;
        if at < 0 {
            return Err(SessionError::Io {
                path: path.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
            });
        }
        file.truncate(at as usize);
        file.extend_from_slice(data);
        Ok(())
    }

    fn stat_size(&self, path: &Path) -> Result<u64, SessionError> {
        self.working
            .get(path)
            .map(|f| f.len() as u64)
            .ok_or_else(|| SessionError::NotFound(path.to_owned()))
    }

    fn commit_and_push(&mut self, _message: &str) -> Result<Oid, SessionError> {
        self.committed_on.push(self.head());
        self.previous_head = Some(self.head());
        if !self.head_sticks {
            self.commits.push(self.working.clone());
        }
        match self.pushes.pop_front().unwrap_or(PushScript::Accept) {
            PushScript::Accept => {
                self.remote.push(self.working.clone());
                Ok(oid(self.head()))
            }
            PushScript::Conflict => {
                self.conflict = true;
                Err(SessionError::NonFastForward)
            }
            PushScript::Fail => Err(SessionError::Push(git2::Error::from_str("connection reset"))),
        }
    }

    fn reconcile(&mut self) -> Result<(), SessionError> {
        self.reconciles += 1;
        if self.conflict {
            let head = self.head();
            match self.previous_head {
                Some(previous) if previous != head => {
                    self.commits.truncate(previous + 1);
                    self.conflict = false;
                }
                _ => return Err(SessionError::Inconsistent { head: oid(head) }),
            }
        }
        if &self.working != self.head_files() {
            self.working = self.head_files().clone();
        }
        Ok(())
    }
}
