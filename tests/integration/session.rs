//! `GitSession` primitives against a real bare remote.

use std::fs;
use std::path::Path;

use gitchat::git::{GitSession, PullOutcome, Session, SessionError};
use tempfile::TempDir;

use crate::fixtures::git::Remote;

#[test]
fn clone_checks_out_default_branch() {
    let remote = Remote::seeded();
    let session = GitSession::clone_remote(&remote.settings()).expect("clone");
    assert_eq!(session.branch(), "main");
    assert_eq!(session.head().unwrap(), remote.tip());
    assert!(session.workdir().join("README.md").exists());
}

#[test]
fn empty_remote_is_rejected() {
    let remote = Remote::empty();
    let err = GitSession::clone_remote(&remote.settings())
        .err()
        .expect("empty remote fails");
    assert!(matches!(err, SessionError::EmptyRemote));
}

#[test]
fn unreachable_remote_fails_clone() {
    let dir = TempDir::new().unwrap();
    let remote = Remote::seeded();
    let mut settings = remote.settings();
    settings.url = dir.path().join("missing.git").display().to_string();
    let err = GitSession::clone_remote(&settings)
        .err()
        .expect("clone fails");
    assert!(matches!(err, SessionError::Clone { .. }));
}

#[test]
fn missing_files_report_not_found() {
    let remote = Remote::seeded();
    let session = GitSession::clone_remote(&remote.settings()).unwrap();
    let err = session.read_file(Path::new("nope.json")).unwrap_err();
    assert!(err.is_not_found());
    let err = session.stat_size(Path::new("nope.json")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn append_seeks_back_from_end() {
    let remote = Remote::seeded();
    let mut session = GitSession::clone_remote(&remote.settings()).unwrap();
    let path = Path::new("deep/dir/file.txt");

    session.append_file(path, b"abc\n]\n", 0).unwrap();
    session.append_file(path, b",def\n]\n", -3).unwrap();
    assert_eq!(session.read_file(path).unwrap(), b"abc,def\n]\n");
    assert_eq!(session.stat_size(path).unwrap(), 10);

    let err = session.append_file(path, b"x", 1).unwrap_err();
    assert!(matches!(err, SessionError::InvalidOffset(1)));
}

#[test]
fn commit_and_push_publishes_staged_writes() {
    let remote = Remote::seeded();
    let mut session = GitSession::clone_remote(&remote.settings()).unwrap();
    session
        .write_file(Path::new("a/b.json"), b"{}\n")
        .unwrap();
    let oid = session.commit_and_push("Add b").unwrap();

    assert_eq!(remote.tip(), oid);
    assert_eq!(remote.file("a/b.json").unwrap(), b"{}\n");
    assert_eq!(remote.tip_message(), "Add b");
    assert_eq!(
        remote.tip_author(),
        ("commentator".to_string(), "commentator@example.com".to_string())
    );
    session.reconcile().unwrap();
    assert!(!session.has_conflict());
}

#[test]
fn pull_fast_forwards_to_remote_tip() {
    let remote = Remote::seeded();
    let mut session = GitSession::clone_remote(&remote.settings()).unwrap();
    assert_eq!(session.pull().unwrap(), PullOutcome::UpToDate);

    let before = session.head().unwrap();
    let theirs = remote.push_competing("other.txt", "hello\n");
    assert_eq!(
        session.pull().unwrap(),
        PullOutcome::FastForwarded {
            from: before,
            to: theirs
        }
    );
    assert_eq!(session.read_file(Path::new("other.txt")).unwrap(), b"hello\n");
}

#[test]
fn rejected_push_is_rolled_back_by_reconcile() {
    let remote = Remote::seeded();
    let mut session = GitSession::clone_remote(&remote.settings()).unwrap();
    let before = session.head().unwrap();

    let theirs = remote.push_competing("other.txt", "first\n");
    session.write_file(Path::new("mine.txt"), b"mine\n").unwrap();
    let err = session.commit_and_push("Add mine").unwrap_err();
    assert!(err.is_conflict());
    assert!(session.has_conflict());
    assert_ne!(session.head().unwrap(), before);

    session.reconcile().expect("rollback");
    assert_eq!(session.head().unwrap(), before);
    assert!(!session.workdir().join("mine.txt").exists());
    assert_eq!(remote.tip(), theirs);
}

#[test]
fn reconcile_discards_stray_changes() {
    let remote = Remote::seeded();
    let mut session = GitSession::clone_remote(&remote.settings()).unwrap();
    let head = session.head().unwrap();

    session.write_file(Path::new("staged.txt"), b"x").unwrap();
    fs::write(session.workdir().join("README.md"), "edited\n").unwrap();
    fs::create_dir_all(session.workdir().join("junk/nested")).unwrap();
    fs::write(session.workdir().join("junk/nested/file"), "x").unwrap();

    session.reconcile().unwrap();

    assert_eq!(session.head().unwrap(), head);
    assert!(!session.workdir().join("staged.txt").exists());
    assert!(!session.workdir().join("junk").exists());
    assert_eq!(
        fs::read_to_string(session.workdir().join("README.md")).unwrap(),
        "comments live here\n"
    );
}

#[test]
fn existing_workdir_is_reused_and_cleaned() {
    let remote = Remote::seeded();
    let workdir = TempDir::new().unwrap();
    let mut settings = remote.settings();
    settings.workdir = Some(workdir.path().join("clone"));

    let first = GitSession::clone_remote(&settings).unwrap();
    fs::write(first.workdir().join("leftover.txt"), "x").unwrap();
    drop(first);

    let second = GitSession::clone_remote(&settings).unwrap();
    assert_eq!(second.workdir(), workdir.path().join("clone"));
    assert!(!second.workdir().join("leftover.txt").exists());
}

#[test]
fn temporary_clone_is_removed_on_drop() {
    let remote = Remote::seeded();
    let session = GitSession::clone_remote(&remote.settings()).unwrap();
    let workdir = session.workdir().to_path_buf();
    assert!(workdir.exists());
    drop(session);
    assert!(!workdir.exists());
}
