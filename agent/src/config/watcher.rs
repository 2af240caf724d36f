//! Configuration hot reload
//!
//! Watches the configuration file and publishes each valid revision as a new
//! immutable snapshot. Passes already running keep the snapshot they started with.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::settings::Config;
use crate::errors::DeployError;

/// Editors tend to emit several events per save
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Re-read the configuration file and publish it if it changed.
///
/// Returns `Ok(false)` when the file parses to the snapshot already published.
/// On error the previous snapshot stays in place.
pub async fn reload(path: &Path, tx: &watch::Sender<Arc<Config>>) -> Result<bool, DeployError> {
    let config = Config::load(path).await?;
    let changed = tx.send_if_modified(|current| {
        if **current == config {
            false
        } else {
            *current = Arc::new(config);
            true
        }
    });
    Ok(changed)
}

/// Watch `path` until the shutdown signal fires, reloading on every change
pub async fn run(
    path: PathBuf,
    tx: watch::Sender<Arc<Config>>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> Result<(), DeployError> {
    info!("Config watcher starting for {}", path.display());

    let watch_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path.file_name().map(|name| name.to_os_string());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Config watcher shutting down...");
                return Ok(());
            }
            event = event_rx.recv() => {
                let Some(event) = event else { return Ok(()) };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(error = %err, "config watcher event error");
                        continue;
                    }
                };
                if !is_relevant(&event, file_name.as_ref()) {
                    continue;
                }

                tokio::time::sleep(DEBOUNCE_WINDOW).await;
                while event_rx.try_recv().is_ok() {}

                match reload(&path, &tx).await {
                    Ok(true) => info!("reload config"),
                    Ok(false) => debug!("config file touched without changes"),
                    Err(err) => error!(error = %err, "reload config error"),
                }
            }
        }
    }
}

fn is_relevant(event: &Event, file_name: Option<&OsString>) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    match file_name {
        Some(name) => event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(name.as_os_str())),
        None => false,
    }
}
