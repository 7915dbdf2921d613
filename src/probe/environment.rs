use futures::future::join_all;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{PreflightError, Result};

use super::{CapabilityCheck, CommandCheck, PathCheck};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Tool,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentCheck {
    pub tool_name: String,
    pub kind: CheckKind,
    pub available: bool,
}

/// True when every tool and critical path was found.
pub fn all_available(checks: &[EnvironmentCheck]) -> bool {
    checks.iter().all(|check| check.available)
}

/// Read-only probes for the tools and files the workflows rely on.
pub struct EnvironmentProbe {
    tools: Vec<Box<dyn CapabilityCheck>>,
    files: Vec<Box<dyn CapabilityCheck>>,
}

impl EnvironmentProbe {
    pub fn new(tools: Vec<Box<dyn CapabilityCheck>>, files: Vec<Box<dyn CapabilityCheck>>) -> Self {
        Self { tools, files }
    }

    /// Builds subprocess-backed tool checks and path checks from the config.
    ///
    /// # Errors
    ///
    /// Returns [`PreflightError::Config`] if a tool has an empty command.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.probe_timeout();

        let tools = config
            .environment
            .tools
            .iter()
            .map(|tool| {
                CommandCheck::from_argv(tool.name.clone(), &tool.command)
                    .map(|check| {
                        Box::new(
                            check
                                .in_dir(config.project_dir.clone())
                                .with_timeout(timeout),
                        ) as Box<dyn CapabilityCheck>
                    })
                    .ok_or_else(|| {
                        PreflightError::Config(format!("tool '{}' has an empty command", tool.name))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let files = config
            .environment
            .critical_paths
            .iter()
            .map(|path| {
                Box::new(PathCheck::single(path.clone()).relative_to(config.project_dir.clone()))
                    as Box<dyn CapabilityCheck>
            })
            .collect();

        Ok(Self::new(tools, files))
    }

    /// Runs every probe and reports tools first, then files, in configured order.
    ///
    /// Probes are independent and run concurrently.
    pub async fn run(&self) -> Vec<EnvironmentCheck> {
        let tools = join_all(
            self.tools
                .iter()
                .map(|check| observe(check.as_ref(), CheckKind::Tool)),
        );
        let files = join_all(
            self.files
                .iter()
                .map(|check| observe(check.as_ref(), CheckKind::File)),
        );
        let (tools, files) = futures::join!(tools, files);

        let checks: Vec<EnvironmentCheck> = tools.into_iter().chain(files).collect();

        info!(
            "Environment: {}/{} checks available",
            checks.iter().filter(|c| c.available).count(),
            checks.len()
        );

        checks
    }
}

async fn observe(check: &dyn CapabilityCheck, kind: CheckKind) -> EnvironmentCheck {
    EnvironmentCheck {
        tool_name: check.name().to_string(),
        kind,
        available: check.check().await,
    }
}
