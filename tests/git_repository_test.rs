//! GitRepository against real temporary repositories.

mod common;

use committy::diff::{ChangeKind, parse_diff};
use committy::error::GitError;
use committy::git::{GitRepository, VersionControl};

use common::TestRepo;

#[test]
fn test_nothing_staged_in_fresh_repo() {
    let test_repo = TestRepo::new();
    let repo = GitRepository::discover(test_repo.path()).unwrap();

    assert!(matches!(repo.staged_diff(), Err(GitError::NoStagedChanges)));
}

#[test]
fn test_staged_diff_on_unborn_branch() {
    let test_repo = TestRepo::new();
    test_repo.write_and_stage("src/lib.rs", "pub fn answer() -> u32 {\n    42\n}\n");

    let repo = GitRepository::discover(test_repo.path()).unwrap();
    let diff = repo.staged_diff().unwrap();
    let summary = parse_diff(&diff);

    assert_eq!(summary.total_files(), 1);
    let file = &summary.files()[0];
    assert_eq!(file.path(), "src/lib.rs");
    assert_eq!(file.kind(), ChangeKind::Added);
    assert_eq!(file.additions(), 3);
}

#[test]
fn test_unstaged_changes_are_ignored() {
    let test_repo = TestRepo::new();
    test_repo.write_and_stage("a.txt", "one\n");
    test_repo.commit_staged("chore: initial");

    test_repo.write_and_stage("a.txt", "one\ntwo\n");
    test_repo.write("b.txt", "not staged\n");

    let repo = GitRepository::discover(test_repo.path()).unwrap();
    let summary = parse_diff(&repo.staged_diff().unwrap());

    assert_eq!(summary.total_files(), 1);
    assert_eq!(summary.files()[0].path(), "a.txt");
    assert_eq!(summary.files()[0].kind(), ChangeKind::Modified);
    assert_eq!(summary.total_additions(), 1);
    assert_eq!(summary.total_deletions(), 0);
}

#[test]
fn test_stage_all_includes_new_and_deleted_files() {
    let test_repo = TestRepo::new();
    test_repo.write_and_stage("old.txt", "bye\n");
    test_repo.commit_staged("chore: initial");

    std::fs::remove_file(test_repo.path().join("old.txt")).unwrap();
    test_repo.write("new.txt", "hello\n");

    let repo = GitRepository::discover(test_repo.path()).unwrap();
    repo.stage_all().unwrap();
    let summary = parse_diff(&repo.staged_diff().unwrap());

    let kinds: Vec<(&str, ChangeKind)> = summary
        .files()
        .iter()
        .map(|f| (f.path(), f.kind()))
        .collect();
    assert!(kinds.contains(&("new.txt", ChangeKind::Added)));
    assert!(kinds.contains(&("old.txt", ChangeKind::Deleted)));
}

#[test]
fn test_commit_records_message() {
    let test_repo = TestRepo::new();
    test_repo.write_and_stage("README.md", "# demo\n");

    let repo = GitRepository::discover(test_repo.path()).unwrap();
    let id = repo.commit("docs: add readme").unwrap();

    assert_eq!(id.len(), 40);
    assert_eq!(test_repo.head_message(), "docs: add readme");
    assert!(matches!(repo.staged_diff(), Err(GitError::NoStagedChanges)));
}

#[test]
fn test_commit_on_top_of_existing_history() {
    let test_repo = TestRepo::new();
    test_repo.write_and_stage("a.txt", "one\n");
    let first = test_repo.commit_staged("chore: initial");

    test_repo.write_and_stage("a.txt", "one\ntwo\n");
    let repo = GitRepository::discover(test_repo.path()).unwrap();
    repo.commit("feat: add second line").unwrap();

    let head = test_repo.repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.parent_id(0).unwrap(), first);
}

#[test]
fn test_discover_outside_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = GitRepository::discover(dir.path());
    assert!(matches!(result, Err(GitError::OpenRepository(_))));
}

#[test]
fn test_paths_with_special_characters_are_kept() {
    let test_repo = TestRepo::new();
    test_repo.write_and_stage("café.txt", "bonjour\n");
    test_repo.write_and_stage("my file.rs", "fn main() {}\n");

    let repo = GitRepository::discover(test_repo.path()).unwrap();
    let summary = parse_diff(&repo.staged_diff().unwrap());

    assert_eq!(summary.total_files(), 2);
    let mut paths: Vec<&str> = summary.files().iter().map(|f| f.path()).collect();
    paths.sort_unstable();
    assert_eq!(paths, vec!["café.txt", "my file.rs"]);
    assert!(summary.files().iter().all(|f| f.additions() == 1));
}
