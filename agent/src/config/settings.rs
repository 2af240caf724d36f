//! Deployer configuration document

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Suffix appended to the project name for bare-run containers
pub const CONTAINER_SUFFIX: &str = "-easy-deploy";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Projects to reconcile, in order
    #[serde(default, rename = "project", alias = "projects")]
    pub projects: Vec<Project>,

    /// Default notification target (`http...`, `pushdeer:<key>`, `tg:<token>`, `lark:<token>`)
    #[serde(default)]
    pub notify: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Pause between reconciliation passes in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound for any single git/docker command in seconds
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_command_timeout_secs() -> u64 {
    900
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            notify: String::new(),
            log_level: LogLevel::Info,
            interval_secs: default_interval_secs(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl Config {
    /// Read, parse and validate the configuration file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        let config: Config = File::new(path.as_ref()).read_yaml().await?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(contents: &str) -> Result<Self, DeployError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        let mut names = HashSet::new();
        for (index, project) in self.projects.iter().enumerate() {
            if project.name.trim().is_empty() {
                return Err(DeployError::ConfigError(format!(
                    "project #{} has an empty name",
                    index + 1
                )));
            }
            if project.repo.trim().is_empty() {
                return Err(DeployError::ConfigError(format!(
                    "project {} has an empty repo",
                    project.name
                )));
            }
            if project.dir.as_os_str().is_empty() {
                return Err(DeployError::ConfigError(format!(
                    "project {} has an empty dir",
                    project.name
                )));
            }
            if !names.insert(project.name.as_str()) {
                return Err(DeployError::ConfigError(format!(
                    "duplicate project name: {}",
                    project.name
                )));
            }
        }
        if self.interval_secs == 0 {
            return Err(DeployError::ConfigError(
                "interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.command_timeout_secs == 0 {
            return Err(DeployError::ConfigError(
                "command_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// A deployable project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique name, also used for the image and container
    pub name: String,

    /// Repository URL
    pub repo: String,

    /// Tracked branch
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Local working copy
    pub dir: PathBuf,

    /// Notification target overriding the global default
    #[serde(default)]
    pub notify: String,
}

fn default_branch() -> String {
    "main".to_string()
}

impl Project {
    /// Image tag built from the working copy
    pub fn image_tag(&self) -> String {
        format!("{}:latest", self.name)
    }

    /// Name of the bare-run container
    pub fn container_name(&self) -> String {
        format!("{}{}", self.name, CONTAINER_SUFFIX)
    }

    /// The project's own target if set, otherwise the global default.
    /// `None` when both are empty.
    pub fn notify_target<'a>(&'a self, default: &'a str) -> Option<&'a str> {
        [self.notify.as_str(), default]
            .into_iter()
            .map(str::trim)
            .find(|target| !target.is_empty())
    }
}
