use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use gitchat::git::{Credentials, RemoteSettings};
use tempfile::TempDir;

pub const BRANCH: &str = "main";

/// A bare remote with one seed commit on `main`.
pub struct Remote {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl Remote {
    pub fn seeded() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("remote.git");
        init_bare_repo(&path).expect("bare remote");

        let seed = dir.path().join("seed");
        let repo = init_repo(&seed).expect("seed repo");
        repo.remote("origin", path.to_str().expect("utf8 path"))
            .expect("add origin");
        fs::write(seed.join("README.md"), "comments live here\n").expect("write readme");
        commit_all(&repo, "seed").expect("seed commit");
        push(&repo).expect("push seed");

        Self { dir, path }
    }

    /// A bare remote without any commit.
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("empty.git");
        init_bare_repo(&path).expect("bare remote");
        Self { dir, path }
    }

    pub fn url(&self) -> String {
        self.path.to_str().expect("utf8 path").to_string()
    }

    pub fn settings(&self) -> RemoteSettings {
        RemoteSettings {
            url: self.url(),
            branch: None,
            credentials: Credentials::default(),
            author_name: "commentator".into(),
            author_email: "commentator@example.com".into(),
            workdir: None,
        }
    }

    pub fn repo(&self) -> Repository {
        Repository::open_bare(&self.path).expect("open remote")
    }

    pub fn tip(&self) -> Oid {
        self.repo()
            .refname_to_id(&format!("refs/heads/{BRANCH}"))
            .expect("remote tip")
    }

    pub fn commit_count(&self) -> usize {
        let repo = self.repo();
        let mut walk = repo.revwalk().expect("revwalk");
        walk.push(self.tip()).expect("push tip");
        walk.count()
    }

    pub fn tip_message(&self) -> String {
        let repo = self.repo();
        let commit = repo.find_commit(self.tip()).expect("tip commit");
        commit.message().unwrap_or_default().to_string()
    }

    pub fn tip_author(&self) -> (String, String) {
        let repo = self.repo();
        let commit = repo.find_commit(self.tip()).expect("tip commit");
        let author = commit.author();
        (
            author.name().unwrap_or_default().to_string(),
            author.email().unwrap_or_default().to_string(),
        )
    }

    /// File contents at the remote tip.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let repo = self.repo();
        let tree = repo.find_commit(self.tip()).ok()?.tree().ok()?;
        let entry = tree.get_path(path.as_ref()).ok()?;
        let blob = repo.find_blob(entry.id()).ok()?;
        Some(blob.content().to_vec())
    }

    /// Another writer: clone, write `path`, commit and push.
    pub fn push_competing(&self, path: &str, contents: &str) -> Oid {
        let scratch = TempDir::new().expect("tempdir");
        let repo = Repository::clone(&self.url(), scratch.path()).expect("competitor clone");
        configure_test_repo(&repo).expect("configure competitor");
        let abs = scratch.path().join(path);
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).expect("competitor dirs");
        }
        fs::write(&abs, contents).expect("competitor write");
        let oid = commit_all(&repo, &format!("competing write to {path}")).expect("commit");
        push(&repo).expect("competitor push");
        oid
    }
}

pub fn init_bare_repo(path: &Path) -> Result<Repository, String> {
    let mut opts = RepositoryInitOptions::new();
    opts.bare(true).initial_head(BRANCH);
    Repository::init_opts(path, &opts)
        .map_err(|err| format!("git init --bare failed for {path:?}: {err}"))
}

pub fn init_repo(path: &Path) -> Result<Repository, String> {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(BRANCH);
    let repo = Repository::init_opts(path, &opts)
        .map_err(|err| format!("git init failed for {path:?}: {err}"))?;
    configure_test_repo(&repo)?;
    Ok(repo)
}

fn configure_test_repo(repo: &Repository) -> Result<(), String> {
    let mut cfg = repo
        .config()
        .map_err(|err| format!("open repo config failed: {err}"))?;
    cfg.set_str("user.name", "Test")
        .map_err(|err| format!("set user.name failed: {err}"))?;
    cfg.set_str("user.email", "test@test.com")
        .map_err(|err| format!("set user.email failed: {err}"))?;
    Ok(())
}

fn commit_all(repo: &Repository, message: &str) -> Result<Oid, String> {
    let mut index = repo.index().map_err(|err| err.to_string())?;
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .map_err(|err| format!("git add failed: {err}"))?;
    index.write().map_err(|err| err.to_string())?;
    let tree_id = index.write_tree().map_err(|err| err.to_string())?;
    let tree = repo.find_tree(tree_id).map_err(|err| err.to_string())?;
    let sig = Signature::now("Test", "test@test.com").map_err(|err| err.to_string())?;
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().map_err(|err| err.to_string())?],
        Err(_) => Vec::new(),
    };
    let parents: Vec<&git2::Commit<'_>> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(|err| format!("git commit failed: {err}"))
}

fn push(repo: &Repository) -> Result<(), String> {
    let mut remote = repo
        .find_remote("origin")
        .map_err(|err| format!("find origin failed: {err}"))?;
    let refspec = format!("refs/heads/{BRANCH}:refs/heads/{BRANCH}");
    remote
        .push(&[refspec.as_str()], None)
        .map_err(|err| format!("git push failed: {err}"))
}
