//! Repository synchronizer tests

use easy_deploy::deploy::git::{sync_repository, SyncOutcome};
use easy_deploy::errors::DeployError;

use crate::support::{argv, project, ScriptedRunner};

#[tokio::test]
async fn test_absent_working_copy_is_cloned_once() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("api");
    let runner = ScriptedRunner::new();

    let outcome = sync_repository(&runner, &project("api", &dir)).await.unwrap();

    assert_eq!(outcome, SyncOutcome::Cloned);
    assert!(outcome.needs_deploy());
    assert_eq!(
        runner.calls(),
        vec![argv(&[
            "git",
            "clone",
            "--depth",
            "1",
            "--branch",
            "main",
            "https://example.com/api.git",
            dir.to_str().unwrap(),
        ])]
    );
}

#[tokio::test]
async fn test_zero_ahead_count_stops_after_check() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    runner.respond(&["git", "rev-list"], "0\n");

    let outcome = sync_repository(&runner, &project("api", tmp.path()))
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::UpToDate);
    assert!(!outcome.needs_deploy());
    assert_eq!(
        runner.calls(),
        vec![
            argv(&["git", "fetch", "origin", "main"]),
            argv(&["git", "rev-list", "--count", "HEAD..origin/main"]),
        ]
    );
    assert!(runner
        .specs()
        .iter()
        .all(|spec| spec.dir.as_deref() == Some(tmp.path())));
}

#[tokio::test]
async fn test_new_commits_are_pulled() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    runner.respond(&["git", "rev-list"], "3\n");

    let outcome = sync_repository(&runner, &project("api", tmp.path()))
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Updated { ahead: 3 });
    assert_eq!(
        runner.calls(),
        vec![
            argv(&["git", "fetch", "origin", "main"]),
            argv(&["git", "rev-list", "--count", "HEAD..origin/main"]),
            argv(&["git", "fetch", "origin", "main"]),
            argv(&["git", "pull", "--ff-only", "origin", "main"]),
        ]
    );
}

#[tokio::test]
async fn test_clone_failure_aborts() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    runner.fail(&["git", "clone"], "fatal: repository not found");

    let err = sync_repository(&runner, &project("api", tmp.path().join("api")))
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::CommandFailed { ref stderr, .. } if stderr.contains("not found")));
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_skips_count() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    runner.fail(&["git", "fetch"], "fatal: unable to access");

    assert!(sync_repository(&runner, &project("api", tmp.path()))
        .await
        .is_err());
    assert_eq!(runner.count(&["git", "rev-list"]), 0);
}

#[tokio::test]
async fn test_pull_failure_aborts() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    runner
        .respond(&["git", "rev-list"], "1\n")
        .fail(&["git", "pull"], "fatal: Not possible to fast-forward");

    assert!(sync_repository(&runner, &project("api", tmp.path()))
        .await
        .is_err());
}

#[tokio::test]
async fn test_unparseable_ahead_count() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    runner.respond(&["git", "rev-list"], "not a number");

    let err = sync_repository(&runner, &project("api", tmp.path()))
        .await
        .unwrap_err();

    match err {
        DeployError::InvalidOutput { command, output } => {
            assert_eq!(command, "git rev-list --count HEAD..origin/main");
            assert_eq!(output, "not a number");
        }
        other => panic!("expected invalid output, got {other:?}"),
    }
    assert_eq!(runner.count(&["git", "pull"]), 0);
}
