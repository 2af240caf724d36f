//! Test doubles shared by the integration tests

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use easy_deploy::config::Project;
use easy_deploy::errors::DeployError;
use easy_deploy::exec::{CommandRunner, CommandSpec};
use easy_deploy::notifier::NotificationSink;

enum Response {
    Output(String),
    Fail(String),
    Missing,
}

struct Rule {
    prefix: Vec<String>,
    response: Response,
    once: bool,
}

/// Records every command and answers from a script of argv-prefix rules.
/// Unscripted commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<CommandSpec>>,
    rules: Mutex<Vec<Rule>>,
    clone_files: Mutex<Vec<(String, String)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, prefix: &[&str], response: Response, once: bool) {
        self.rules.lock().unwrap().push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            response,
            once,
        });
    }

    /// Always answer commands starting with `prefix` with `output`
    pub fn respond(&self, prefix: &[&str], output: &str) -> &Self {
        self.push(prefix, Response::Output(output.to_string()), false);
        self
    }

    /// Answer the next matching command only
    pub fn respond_once(&self, prefix: &[&str], output: &str) -> &Self {
        self.push(prefix, Response::Output(output.to_string()), true);
        self
    }

    /// Fail every command starting with `prefix`
    pub fn fail(&self, prefix: &[&str], stderr: &str) -> &Self {
        self.push(prefix, Response::Fail(stderr.to_string()), false);
        self
    }

    /// Make every command starting with `prefix` fail to spawn
    pub fn missing(&self, prefix: &[&str]) -> &Self {
        self.push(prefix, Response::Missing, false);
        self
    }

    /// Files a successful `git clone` writes into the target directory
    pub fn on_clone_write(&self, name: &str, contents: &str) -> &Self {
        self.clone_files
            .lock()
            .unwrap()
            .push((name.to_string(), contents.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|spec| spec.argv().into_iter().map(str::to_string).collect())
            .collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &[&str]) -> usize {
        self.calls()
            .iter()
            .filter(|argv| starts_with(argv, prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

fn starts_with(argv: &[String], prefix: &[impl AsRef<str>]) -> bool {
    argv.len() >= prefix.len() && argv.iter().zip(prefix).all(|(a, p)| a == p.as_ref())
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn output(&self, spec: &CommandSpec) -> Result<String, DeployError> {
        self.calls.lock().unwrap().push(spec.clone());
        let argv: Vec<String> = spec.argv().into_iter().map(str::to_string).collect();

        let response = {
            let mut rules = self.rules.lock().unwrap();
            match rules.iter().position(|rule| starts_with(&argv, &rule.prefix)) {
                Some(index) if rules[index].once => Some(rules.remove(index).response),
                Some(index) => Some(match &rules[index].response {
                    Response::Output(out) => Response::Output(out.clone()),
                    Response::Fail(err) => Response::Fail(err.clone()),
                    Response::Missing => Response::Missing,
                }),
                None => None,
            }
        };

        match response {
            Some(Response::Fail(stderr)) => Err(DeployError::CommandFailed {
                command: spec.to_string(),
                status: "exit status: 1".to_string(),
                stderr,
            }),
            Some(Response::Missing) => Err(DeployError::SpawnError {
                command: spec.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            }),
            Some(Response::Output(out)) => {
                self.after_success(&argv);
                Ok(out)
            }
            None => {
                self.after_success(&argv);
                Ok(String::new())
            }
        }
    }
}

impl ScriptedRunner {
    fn after_success(&self, argv: &[String]) {
        if !starts_with(argv, &["git", "clone"]) {
            return;
        }
        let Some(target) = argv.last() else { return };
        std::fs::create_dir_all(target).unwrap();
        for (name, contents) in self.clone_files.lock().unwrap().iter() {
            std::fs::write(Path::new(target).join(name), contents).unwrap();
        }
    }
}

/// Records notifications instead of sending them
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, message: &str, target: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), target.to_string()));
    }
}

pub fn project(name: &str, dir: impl Into<PathBuf>) -> Project {
    Project {
        name: name.to_string(),
        repo: format!("https://example.com/{name}.git"),
        branch: "main".to_string(),
        dir: dir.into(),
        notify: String::new(),
    }
}

pub fn argv(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
