//! Application configuration options

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default configuration document
pub const DEFAULT_CONFIG_PATH: &str = "deploy.yaml";

/// Flags that take the following argument as their value (`-c deploy.yaml`)
const VALUE_FLAGS: &[&str] = &["c", "config", "log-dir"];

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Configuration document path
    pub config_path: PathBuf,

    /// Run a single pass and exit
    pub once: bool,

    /// Emit JSON logs on stdout
    pub json_logs: bool,

    /// Directory for rolling log files
    pub log_dir: Option<PathBuf>,

    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            once: false,
            json_logs: false,
            log_dir: None,
            lifecycle: LifecycleOptions::default(),
        }
    }
}

impl AppOptions {
    /// Build options from parsed command line arguments
    pub fn from_args(args: &HashMap<String, String>) -> Self {
        let config_path = args
            .get("config")
            .or_else(|| args.get("c"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self {
            config_path,
            once: args.contains_key("once"),
            json_logs: args.contains_key("json-logs"),
            log_dir: args.get("log-dir").map(PathBuf::from),
            ..Default::default()
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum time to wait for the in-flight pass on shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(300),
        }
    }
}

/// Parse `--key=value`, `--flag` and `-c <value>` style arguments.
/// Leading dashes are stripped from keys; bare flags map to `"true"`.
pub fn parse_args<I>(args: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = HashMap::new();
    let mut args = args.into_iter().peekable();

    while let Some(arg) = args.next() {
        if !arg.starts_with('-') {
            continue;
        }
        if let Some((key, value)) = arg.split_once('=') {
            parsed.insert(key.trim_start_matches('-').to_string(), value.to_string());
            continue;
        }

        let key = arg.trim_start_matches('-').to_string();
        if VALUE_FLAGS.contains(&key.as_str()) {
            if let Some(value) = args.next_if(|next| !next.starts_with('-')) {
                parsed.insert(key, value);
                continue;
            }
        }
        parsed.insert(key, "true".to_string());
    }

    parsed
}
