//! Docker Compose deployment

use std::path::Path;

use tracing::{debug, info};

use crate::errors::DeployError;
use crate::exec::{CommandRunner, CommandSpec};

/// Compose CLI flavour: the standalone binary or the docker plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCli {
    Standalone,
    Plugin,
}

impl ComposeCli {
    fn command(self, dir: &Path) -> CommandSpec {
        let command = match self {
            ComposeCli::Standalone => CommandSpec::new("docker-compose"),
            ComposeCli::Plugin => CommandSpec::new("docker").arg("compose"),
        };
        command.current_dir(dir)
    }
}

/// Bring the service group up, recreating changed services and removing
/// orphans. Returns the ids of the resulting containers.
pub async fn deploy_compose(
    runner: &dyn CommandRunner,
    dir: &Path,
) -> Result<Vec<String>, DeployError> {
    info!("Deploying with Docker Compose in: {}", dir.display());

    // Only a missing standalone binary falls back; a failed `up` is final.
    let cli = match up(runner, ComposeCli::Standalone, dir).await {
        Ok(()) => ComposeCli::Standalone,
        Err(DeployError::SpawnError { source, .. }) => {
            debug!("docker-compose unavailable ({}), trying 'docker compose'...", source);
            up(runner, ComposeCli::Plugin, dir).await?;
            ComposeCli::Plugin
        }
        Err(e) => return Err(e),
    };

    let output = runner
        .output(&cli.command(dir).args(["ps", "-q"]))
        .await?;
    let ids: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    info!(services = ?ids, "service id");
    Ok(ids)
}

async fn up(runner: &dyn CommandRunner, cli: ComposeCli, dir: &Path) -> Result<(), DeployError> {
    runner
        .output(&cli.command(dir).args(["up", "-d", "--remove-orphans"]))
        .await
        .map(|_| ())
}
