//! Repository synchronization
//!
//! Keeps a project's working copy at the tip of its tracked branch and reports
//! whether anything new was pulled. The ahead-count check is the only thing
//! standing between an idle pass and a full rebuild.

use tracing::{debug, info};

use crate::config::Project;
use crate::errors::DeployError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::filesys::dir::Dir;

/// Result of synchronizing a working copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The working copy was absent and has been cloned
    Cloned,

    /// `ahead` new commits were pulled from the remote
    Updated { ahead: u64 },

    /// The working copy already matches the remote tip
    UpToDate,
}

impl SyncOutcome {
    pub fn needs_deploy(&self) -> bool {
        !matches!(self, SyncOutcome::UpToDate)
    }
}

/// Clone or fast-forward the project's working copy
pub async fn sync_repository(
    runner: &dyn CommandRunner,
    project: &Project,
) -> Result<SyncOutcome, DeployError> {
    let working_copy = Dir::new(&project.dir);

    if !working_copy.exists().await {
        info!(
            "Cloning {} (branch: {}) into {}",
            project.repo,
            project.branch,
            project.dir.display()
        );
        runner.output(&clone_command(project)).await?;
        return Ok(SyncOutcome::Cloned);
    }

    debug!("Working copy exists, fetching origin/{}...", project.branch);
    runner.output(&fetch_command(project)).await?;

    let ahead = ahead_count(runner, project).await?;
    if ahead == 0 {
        info!("no new commit");
        return Ok(SyncOutcome::UpToDate);
    }

    info!(ahead, "new commits on origin/{}", project.branch);

    // A push may have landed between the count and the pull.
    runner.output(&fetch_command(project)).await?;
    runner
        .output(&git(project).args(["pull", "--ff-only", "origin", project.branch.as_str()]))
        .await?;

    Ok(SyncOutcome::Updated { ahead })
}

/// Number of commits on `origin/<branch>` that `HEAD` does not have
pub async fn ahead_count(
    runner: &dyn CommandRunner,
    project: &Project,
) -> Result<u64, DeployError> {
    let command = git(project).args([
        "rev-list".to_string(),
        "--count".to_string(),
        format!("HEAD..origin/{}", project.branch),
    ]);
    let output = runner.output(&command).await?;
    let parsed = output.trim().parse::<u64>();
    parsed.map_err(|_| DeployError::InvalidOutput {
        command: command.to_string(),
        output,
    })
}

fn clone_command(project: &Project) -> CommandSpec {
    CommandSpec::new("git").args([
        "clone".to_string(),
        "--depth".to_string(),
        "1".to_string(),
        "--branch".to_string(),
        project.branch.clone(),
        project.repo.clone(),
        project.dir.to_string_lossy().into_owned(),
    ])
}

fn fetch_command(project: &Project) -> CommandSpec {
    git(project).args(["fetch", "origin", project.branch.as_str()])
}

fn git(project: &Project) -> CommandSpec {
    CommandSpec::new("git").current_dir(&project.dir)
}
