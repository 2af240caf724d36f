//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::config::{watcher, Config};
use crate::deploy::{PassReport, Reconciler};
use crate::errors::DeployError;
use crate::exec::SystemRunner;
use crate::notifier::Notifier;
use crate::workers::poller;

/// Build the reconciler for a configuration snapshot
pub fn build_reconciler(config: &Config) -> Result<Reconciler, DeployError> {
    let runner = Arc::new(SystemRunner::new(config.command_timeout()));
    let notifier = Arc::new(Notifier::new()?);
    Ok(Reconciler::new(runner, notifier))
}

/// Run a single reconciliation pass
pub async fn run_once(config: &Config) -> Result<PassReport, DeployError> {
    let reconciler = build_reconciler(config)?;
    Ok(reconciler.run_pass(config).await)
}

/// Run the deployer until the shutdown signal fires
pub async fn run(
    options: AppOptions,
    config: Config,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeployError> {
    info!("Initializing deployer...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    let reconciler = Arc::new(build_reconciler(&config)?);
    let (config_tx, config_rx) = watch::channel(Arc::new(config));

    init_config_watcher(&options, config_tx, &mut shutdown_manager, shutdown_tx.subscribe())?;
    init_poller_worker(reconciler, config_rx, &mut shutdown_manager, shutdown_tx.subscribe())?;

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

fn init_config_watcher(
    options: &AppOptions,
    config_tx: watch::Sender<Arc<Config>>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DeployError> {
    info!("Initializing config watcher...");

    let path = options.config_path.clone();
    let handle = tokio::spawn(async move {
        let result = watcher::run(
            path,
            config_tx,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
        if let Err(e) = &result {
            // Passes keep running on the last snapshot.
            error!("Config watcher stopped, hot reload disabled: {}", e);
        }
        result
    });

    shutdown_manager.with_config_watcher_handle(handle)
}

fn init_poller_worker(
    reconciler: Arc<Reconciler>,
    config_rx: watch::Receiver<Arc<Config>>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DeployError> {
    info!("Initializing poller worker...");

    let handle = tokio::spawn(async move {
        poller::run(
            reconciler.as_ref(),
            config_rx,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await
    });

    shutdown_manager.with_poller_worker_handle(handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    config_watcher_handle: Option<JoinHandle<Result<(), DeployError>>>,
    poller_worker_handle: Option<JoinHandle<u64>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            config_watcher_handle: None,
            poller_worker_handle: None,
        }
    }

    fn with_config_watcher_handle(
        &mut self,
        handle: JoinHandle<Result<(), DeployError>>,
    ) -> Result<(), DeployError> {
        if self.config_watcher_handle.is_some() {
            return Err(DeployError::ShutdownError("config_watcher_handle already set".to_string()));
        }
        self.config_watcher_handle = Some(handle);
        Ok(())
    }

    fn with_poller_worker_handle(&mut self, handle: JoinHandle<u64>) -> Result<(), DeployError> {
        if self.poller_worker_handle.is_some() {
            return Err(DeployError::ShutdownError("poller_handle already set".to_string()));
        }
        self.poller_worker_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), DeployError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DeployError::ShutdownError(format!(
                "in-flight pass did not finish within {:?}",
                self.lifecycle_options.max_shutdown_delay
            ))),
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), DeployError> {
        info!("Shutting down deployer...");

        // 1. Config watcher
        if let Some(handle) = self.config_watcher_handle.take() {
            // Errors were already logged when the watcher stopped.
            let _ = handle
                .await
                .map_err(|e| DeployError::ShutdownError(e.to_string()))?;
        }

        // 2. Poller worker, after its in-flight pass
        if let Some(handle) = self.poller_worker_handle.take() {
            let passes = handle
                .await
                .map_err(|e| DeployError::ShutdownError(e.to_string()))?;
            info!(passes, "Poller worker stopped");
        }

        info!("Shutdown complete");
        Ok(())
    }
}
