//! Build & runtime management for a synchronized working copy

use tracing::{info, warn};

use crate::config::Project;
use crate::deploy::{compose, docker, port};
use crate::errors::DeployError;
use crate::exec::CommandRunner;
use crate::filesys::dir::Dir;

/// Image build recipe marker
pub const DOCKERFILE: &str = "Dockerfile";

/// Multi-service manifest marker
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// How the project was brought up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// `docker-compose up`
    Compose,

    /// Single `docker run` of `<name>:latest`
    BareRun,
}

/// What a deployment did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub mechanism: Mechanism,

    /// Whether a Dockerfile was found and built
    pub image_built: bool,

    /// Port extracted from the Dockerfile, if any
    pub port: Option<String>,

    /// Container ids now running for the project
    pub containers: Vec<String>,
}

/// Build and (re)start the project from its working copy.
///
/// A Dockerfile is built first when present. A compose manifest then takes
/// over the lifecycle; otherwise the previous bare-run container is replaced.
pub async fn deploy_working_copy(
    runner: &dyn CommandRunner,
    project: &Project,
) -> Result<DeployReport, DeployError> {
    let working_copy = Dir::new(&project.dir);
    let dockerfile = working_copy.file(DOCKERFILE);

    let mut image_built = false;
    let mut exposed = None;

    if dockerfile.exists().await {
        docker::build_image(runner, project).await?;
        image_built = true;

        exposed = match dockerfile.read_string().await {
            Ok(contents) => port::extract_port(&contents),
            Err(e) => {
                warn!("Could not read {}: {}", dockerfile.path().display(), e);
                None
            }
        };
        if let Some(port) = &exposed {
            info!(port = %port, "exported");
        }
    }

    if working_copy.file(COMPOSE_FILE).exists().await {
        let containers = compose::deploy_compose(runner, working_copy.path()).await?;
        return Ok(DeployReport {
            mechanism: Mechanism::Compose,
            image_built,
            port: exposed,
            containers,
        });
    }

    let container = docker::replace_container(runner, project, exposed.as_deref()).await?;
    Ok(DeployReport {
        mechanism: Mechanism::BareRun,
        image_built,
        port: exposed,
        containers: Some(container).filter(|id| !id.is_empty()).into_iter().collect(),
    })
}
