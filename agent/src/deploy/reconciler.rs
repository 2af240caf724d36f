//! Reconciliation driver
//!
//! One pass walks the configured projects in order. Each project is synced,
//! rebuilt and redeployed only when upstream moved, then announced. A failing
//! project is logged and skipped; the rest of the pass carries on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, info_span, Instrument};

use crate::config::{Config, Project};
use crate::deploy::executor::{self, DeployReport};
use crate::deploy::git::{self, SyncOutcome};
use crate::errors::DeployError;
use crate::exec::CommandRunner;
use crate::notifier::NotificationSink;
use crate::utils::generate_uuid;

/// Completion message sent after a successful deployment
pub fn completion_message(project: &Project) -> String {
    format!("{} deployed", project.name)
}

/// What happened to one project during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOutcome {
    /// Working copy already at the remote tip; nothing was touched
    UpToDate,

    /// Synced and redeployed
    Deployed {
        sync: SyncOutcome,
        report: DeployReport,
        notified: bool,
    },
}

/// Per-project result of a pass
#[derive(Debug)]
pub struct ProjectResult {
    pub name: String,
    pub outcome: Result<ProjectOutcome, DeployError>,
}

/// Summary of one reconciliation pass
#[derive(Debug)]
pub struct PassReport {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ProjectResult>,
}

impl PassReport {
    pub fn deployed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Ok(ProjectOutcome::Deployed { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_err()).count()
    }

    /// Wall-clock duration of the pass
    pub fn elapsed(&self) -> chrono::TimeDelta {
        self.finished_at - self.started_at
    }

    pub fn result(&self, name: &str) -> Option<&ProjectResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

/// Drives the per-project procedure through a command runner and a notifier
pub struct Reconciler {
    runner: Arc<dyn CommandRunner>,
    notifier: Arc<dyn NotificationSink>,
}

impl Reconciler {
    pub fn new(runner: Arc<dyn CommandRunner>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { runner, notifier }
    }

    /// Run exactly one pass over `config.projects`
    pub async fn run_pass(&self, config: &Config) -> PassReport {
        let id = generate_uuid();
        let started_at = Utc::now();
        let span = info_span!("pass", id = %id);

        let results = async {
            let mut results = Vec::with_capacity(config.projects.len());
            for project in &config.projects {
                let outcome = self
                    .deploy_project(project, &config.notify)
                    .instrument(info_span!("project", name = %project.name))
                    .await;
                if let Err(e) = &outcome {
                    error!(project = %project.name, error = %e, "deployment failed");
                }
                results.push(ProjectResult {
                    name: project.name.clone(),
                    outcome,
                });
            }
            results
        }
        .instrument(span)
        .await;

        let report = PassReport {
            id,
            started_at,
            finished_at: Utc::now(),
            results,
        };
        info!(
            pass = %report.id,
            projects = report.results.len(),
            deployed = report.deployed(),
            failed = report.failed(),
            elapsed_ms = report.elapsed().num_milliseconds(),
            "Reconciliation pass finished"
        );
        report
    }

    /// Sync, redeploy if upstream moved, then notify
    pub async fn deploy_project(
        &self,
        project: &Project,
        default_notify: &str,
    ) -> Result<ProjectOutcome, DeployError> {
        let sync = git::sync_repository(self.runner.as_ref(), project).await?;
        if !sync.needs_deploy() {
            return Ok(ProjectOutcome::UpToDate);
        }

        let report = executor::deploy_working_copy(self.runner.as_ref(), project).await?;
        info!(mechanism = ?report.mechanism, "Deployed {}", project.name);

        let notified = match project.notify_target(default_notify) {
            Some(target) => {
                self.notifier
                    .notify(&completion_message(project), target)
                    .await;
                true
            }
            None => false,
        };

        Ok(ProjectOutcome::Deployed {
            sync,
            report,
            notified,
        })
    }
}
