//! Polling worker tests

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use easy_deploy::config::Config;
use easy_deploy::deploy::Reconciler;
use easy_deploy::workers::poller;
use tokio::sync::{watch, Notify};

use crate::support::{project, RecordingSink, ScriptedRunner};

type SleepFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[tokio::test]
async fn test_shutdown_is_observed_between_passes() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    let reconciler = Reconciler::new(runner.clone(), Arc::new(RecordingSink::default()));
    let config = Config {
        projects: vec![project("api", tmp.path().join("api"))],
        ..Default::default()
    };
    let (_config_tx, config_rx) = watch::channel(Arc::new(config));

    let passes = poller::run(
        &reconciler,
        config_rx,
        |_| std::future::pending::<()>(),
        Box::pin(async {}),
    )
    .await;

    assert_eq!(passes, 1);
    assert_eq!(runner.count(&["git", "clone"]), 1);
}

#[tokio::test]
async fn test_reloaded_snapshot_is_used_by_next_pass() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    let reconciler = Reconciler::new(runner.clone(), Arc::new(RecordingSink::default()));

    let first = Config {
        projects: vec![project("api", tmp.path().join("api"))],
        ..Default::default()
    };
    let second = Config {
        projects: vec![project("web", tmp.path().join("web"))],
        interval_secs: 7,
        ..Default::default()
    };
    let (config_tx, config_rx) = watch::channel(Arc::new(first));

    let stop = Arc::new(Notify::new());
    let sleeps = Arc::new(Mutex::new(Vec::new()));
    let calls = AtomicUsize::new(0);

    let sleep_fn = {
        let stop = stop.clone();
        let sleeps = sleeps.clone();
        let second = Arc::new(second);
        move |interval: Duration| -> SleepFuture {
            sleeps.lock().unwrap().push(interval);
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                config_tx.send(second.clone()).unwrap();
                Box::pin(std::future::ready(()))
            } else {
                stop.notify_one();
                Box::pin(std::future::pending())
            }
        }
    };
    let shutdown = {
        let stop = stop.clone();
        Box::pin(async move { stop.notified().await })
    };

    let passes = poller::run(&reconciler, config_rx, sleep_fn, shutdown).await;

    assert_eq!(passes, 2);
    assert_eq!(
        *sleeps.lock().unwrap(),
        vec![Duration::from_secs(5), Duration::from_secs(7)]
    );
    assert_eq!(
        runner.count(&["git", "clone", "--depth", "1", "--branch", "main", "https://example.com/api.git"]),
        1
    );
    assert_eq!(
        runner.count(&["git", "clone", "--depth", "1", "--branch", "main", "https://example.com/web.git"]),
        1
    );
}
