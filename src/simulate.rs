use futures::future::join_all;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{PreflightError, Result};
use crate::probe::{CapabilityCheck, CommandCheck, PathCheck};

/// The fixed battery of verification steps, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationKind {
    /// Type-check the sources
    TypeCheck,

    /// Lint the sources
    Lint,

    /// Dependency manifest present and dependencies installed
    Dependencies,

    /// Platform build files present
    PlatformFiles,
}

impl SimulationKind {
    pub const ALL: [SimulationKind; 4] = [
        SimulationKind::TypeCheck,
        SimulationKind::Lint,
        SimulationKind::Dependencies,
        SimulationKind::PlatformFiles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SimulationKind::TypeCheck => "type-check",
            SimulationKind::Lint => "lint",
            SimulationKind::Dependencies => "dependencies",
            SimulationKind::PlatformFiles => "platform-files",
        }
    }

    /// Advisory steps are reported but never gate readiness.
    pub fn advisory(&self) -> bool {
        matches!(
            self,
            SimulationKind::Dependencies | SimulationKind::PlatformFiles
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStep {
    pub name: String,
    pub succeeded: bool,
    pub advisory: bool,
}

/// True when every gating step succeeded.
pub fn gating_steps_passed(steps: &[SimulationStep]) -> bool {
    steps.iter().all(|step| step.advisory || step.succeeded)
}

pub struct StepSimulator {
    steps: Vec<(SimulationKind, Box<dyn CapabilityCheck>)>,
}

impl StepSimulator {
    /// Builds a simulator from one check per [`SimulationKind`], in
    /// [`SimulationKind::ALL`] order.
    pub fn new(checks: [Box<dyn CapabilityCheck>; 4]) -> Self {
        Self {
            steps: SimulationKind::ALL.into_iter().zip(checks).collect(),
        }
    }

    /// # Errors
    ///
    /// Returns [`PreflightError::Config`] if the type-check or lint command is empty.
    pub fn from_config(config: &Config) -> Result<Self> {
        let simulation = &config.simulation;
        let project_dir = config.project_dir.clone();
        let timeout = config.probe_timeout();

        let command = |kind: SimulationKind, argv: &[String]| {
            CommandCheck::from_argv(kind.name(), argv)
                .map(|check| check.in_dir(project_dir.clone()).with_timeout(timeout))
                .ok_or_else(|| {
                    PreflightError::Config(format!("simulation {} command is empty", kind.name()))
                })
        };

        let type_check = command(SimulationKind::TypeCheck, &simulation.type_check)?;
        let lint = command(SimulationKind::Lint, &simulation.lint)?;

        let dependencies = PathCheck::new(
            SimulationKind::Dependencies.name(),
            vec![
                simulation.dependency_manifest.clone(),
                simulation.dependency_dir.clone(),
            ],
        )
        .relative_to(project_dir.clone());

        let platform_files = PathCheck::new(
            SimulationKind::PlatformFiles.name(),
            simulation.platform_files.clone(),
        )
        .relative_to(project_dir);

        Ok(Self::new([
            Box::new(type_check),
            Box::new(lint),
            Box::new(dependencies),
            Box::new(platform_files),
        ]))
    }

    /// Runs every step. A failing step never skips the ones after it.
    pub async fn run(&self) -> Vec<SimulationStep> {
        join_all(self.steps.iter().map(|(kind, check)| async move {
            let succeeded = check.check().await;
            info!(
                "Simulation step {}: {}",
                kind.name(),
                if succeeded { "passed" } else { "failed" }
            );
            SimulationStep {
                name: kind.name().to_string(),
                succeeded,
                advisory: kind.advisory(),
            }
        }))
        .await
    }
}
