mod environment;

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use tokio::process::Command;

pub use environment::{all_available, CheckKind, EnvironmentCheck, EnvironmentProbe};

/// A named probe that answers yes or no.
pub trait CapabilityCheck: Send + Sync {
    fn name(&self) -> &str;

    /// Runs the probe. Failures of any kind resolve to `false`.
    fn check(&self) -> BoxFuture<'_, bool>;
}

/// Succeeds when the command exits with status zero.
#[derive(Debug, Clone)]
pub struct CommandCheck {
    name: String,
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl CommandCheck {
    /// Builds a check from an argv list. Returns `None` for an empty list.
    pub fn from_argv(name: impl Into<String>, argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            name: name.into(),
            program: program.clone(),
            args: args.to_vec(),
            working_dir: None,
            timeout: None,
        })
    }

    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self) -> bool {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.status()).await {
                Ok(status) => status,
                Err(_) => {
                    warn!(
                        "{}: `{}` timed out after {}s",
                        self.name,
                        self.program,
                        limit.as_secs()
                    );
                    return false;
                }
            },
            None => command.status().await,
        };

        match status {
            Ok(status) => {
                debug!("{}: `{}` exited with {status}", self.name, self.program);
                status.success()
            }
            Err(err) => {
                debug!("{}: failed to spawn `{}`: {err}", self.name, self.program);
                false
            }
        }
    }
}

impl CapabilityCheck for CommandCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> BoxFuture<'_, bool> {
        self.run().boxed()
    }
}

/// Succeeds when every listed path exists.
#[derive(Debug, Clone)]
pub struct PathCheck {
    name: String,
    paths: Vec<PathBuf>,
    base: Option<PathBuf>,
}

impl PathCheck {
    pub fn new(name: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            paths,
            base: None,
        }
    }

    /// A check named after the single path it looks for.
    pub fn single(path: PathBuf) -> Self {
        Self::new(path.display().to_string(), vec![path])
    }

    /// Resolves relative paths against `base` instead of the current directory.
    pub fn relative_to(mut self, base: Option<PathBuf>) -> Self {
        self.base = base;
        self
    }

    async fn run(&self) -> bool {
        for path in &self.paths {
            let path = match &self.base {
                Some(base) => base.join(path),
                None => path.clone(),
            };

            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                debug!("{}: missing {}", self.name, path.display());
                return false;
            }
        }
        true
    }
}

impl CapabilityCheck for PathCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> BoxFuture<'_, bool> {
        self.run().boxed()
    }
}

/// A check with a predetermined outcome.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedCheck {
    name: String,
    outcome: bool,
}

#[cfg(test)]
impl FixedCheck {
    pub fn new(name: impl Into<String>, outcome: bool) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }
}

#[cfg(test)]
impl CapabilityCheck for FixedCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> BoxFuture<'_, bool> {
        futures::future::ready(self.outcome).boxed()
    }
}
