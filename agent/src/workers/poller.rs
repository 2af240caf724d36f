//! Polling worker: repeated reconciliation passes

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::Config;
use crate::deploy::Reconciler;

/// Run passes until shutdown, pausing `interval_secs` from the current
/// snapshot between them. Returns the number of passes completed.
///
/// Shutdown is only observed between passes so a deployment is never cut
/// off halfway.
pub async fn run<S, F>(
    reconciler: &Reconciler,
    config_rx: watch::Receiver<Arc<Config>>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> u64
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting...");

    let mut passes = 0;
    loop {
        let config = config_rx.borrow().clone();
        debug!(projects = config.projects.len(), "Starting reconciliation pass");
        reconciler.run_pass(&config).await;
        passes += 1;

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return passes;
            }
            _ = sleep_fn(config.interval()) => {
                // Continue with the next pass
            }
        }
    }
}
