//! Docker image build and bare-run container lifecycle

use tracing::{debug, info, warn};

use crate::config::Project;
use crate::errors::DeployError;
use crate::exec::{CommandRunner, CommandSpec};

/// Build `<name>:latest` from the project's working copy
pub async fn build_image(runner: &dyn CommandRunner, project: &Project) -> Result<(), DeployError> {
    let tag = project.image_tag();
    info!("Building image {} from {}", tag, project.dir.display());

    runner
        .output(
            &CommandSpec::new("docker")
                .args(["build", "-t", tag.as_str(), "."])
                .current_dir(&project.dir),
        )
        .await?;

    info!("Successfully built image {}", tag);
    Ok(())
}

/// Ids of containers (running or not) named exactly `container_name`
pub async fn find_containers(
    runner: &dyn CommandRunner,
    container_name: &str,
) -> Result<Vec<String>, DeployError> {
    let output = runner
        .output(&CommandSpec::new("docker").args([
            "ps".to_string(),
            "-a".to_string(),
            "-q".to_string(),
            "-f".to_string(),
            format!("name=^{}$", container_name),
        ]))
        .await?;

    Ok(output
        .lines()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect())
}

/// Stop and remove a container so its name can be reused
pub async fn remove_container(runner: &dyn CommandRunner, id: &str) -> Result<(), DeployError> {
    runner
        .output(&CommandSpec::new("docker").args(["stop", id]))
        .await?;
    info!(container_id = id, "docker stop");

    runner
        .output(&CommandSpec::new("docker").args(["rm", id]))
        .await?;
    debug!(container_id = id, "docker rm");
    Ok(())
}

/// Replace any previous instance of the project's container with a fresh one.
///
/// The extracted port is published as `<port>:<port>`. Without one the run is
/// still attempted with an empty mapping and left to the engine to reject.
pub async fn replace_container(
    runner: &dyn CommandRunner,
    project: &Project,
    port: Option<&str>,
) -> Result<String, DeployError> {
    let container_name = project.container_name();

    for id in find_containers(runner, &container_name).await? {
        remove_container(runner, &id).await?;
    }

    let port = port.unwrap_or_default();
    if port.is_empty() {
        warn!(
            "No EXPOSE directive for {}, running with an empty port mapping",
            project.name
        );
    }

    let image = project.image_tag();
    info!("docker run -d -p {port}:{port} --name {container_name} {image}");
    let output = runner
        .output(&CommandSpec::new("docker").args([
            "run".to_string(),
            "-d".to_string(),
            "-p".to_string(),
            format!("{port}:{port}"),
            "--name".to_string(),
            container_name.clone(),
            image,
        ]))
        .await?;

    info!(name = %container_name, "docker run");
    Ok(output.trim().to_string())
}
