//! Error types for the deployer

use std::time::Duration;

use thiserror::Error;

/// Main error type for the deployer
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Failed to spawn `{command}`: {source}")]
    SpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("Unexpected output from `{command}`: {output:?}")]
    InvalidOutput { command: String, output: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Watcher error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("Notification transport not implemented: {0}")]
    UnsupportedTransport(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}
