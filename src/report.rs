use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Result;
use crate::probe::{all_available, EnvironmentCheck};
use crate::simulate::{gating_steps_passed, SimulationStep};
use crate::workflow::{DocumentAnalysis, Issue, SecretUsage, ValidationResult, WorkflowOverview};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    Ready,
    IssuesDetected,
}

impl ReadinessStatus {
    pub fn is_ready(self) -> bool {
        self == ReadinessStatus::Ready
    }
}

/// Writes a path as text, replacing invalid UTF-8 so a report can always be written.
pub fn serialize_path<S>(path: &Path, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&path.to_string_lossy())
}

/// The single artifact a run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_path")]
    pub root: PathBuf,
    pub validations: Vec<ValidationResult>,
    /// Triggers and job layout of every valid workflow
    pub workflows: Vec<WorkflowOverview>,
    pub issues: Vec<Issue>,
    pub secrets: Vec<SecretUsage>,
    pub environment: Vec<EnvironmentCheck>,
    pub simulation: Vec<SimulationStep>,
    pub status: ReadinessStatus,
}

/// `Ready` iff every document is valid, every probe is available and every
/// gating simulation step passed. Issues never count.
pub fn compute_status(
    validations: &[ValidationResult],
    environment: &[EnvironmentCheck],
    simulation: &[SimulationStep],
) -> ReadinessStatus {
    let documents_valid = validations.iter().all(ValidationResult::is_valid);

    if documents_valid && all_available(environment) && gating_steps_passed(simulation) {
        ReadinessStatus::Ready
    } else {
        ReadinessStatus::IssuesDetected
    }
}

impl ReadinessReport {
    /// Joins every stage's results into one report, preserving their order.
    pub fn assemble(
        root: &Path,
        analyses: Vec<DocumentAnalysis>,
        environment: Vec<EnvironmentCheck>,
        simulation: Vec<SimulationStep>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut validations = Vec::with_capacity(analyses.len());
        let mut workflows = Vec::new();
        let mut issues = Vec::new();
        let mut secrets = Vec::new();

        for analysis in analyses {
            validations.push(analysis.validation);
            workflows.extend(analysis.overview);
            issues.extend(analysis.detection.issues);
            secrets.extend(analysis.detection.secrets);
        }

        let status = compute_status(&validations, &environment, &simulation);

        Self {
            timestamp,
            root: root.to_path_buf(),
            validations,
            workflows,
            issues,
            secrets,
            environment,
            simulation,
            status,
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Writes the report to `path`, replacing any previous report.
    ///
    /// The JSON goes to a sibling temporary file first and is renamed into
    /// place, so readers never observe a half-written report.
    pub fn persist(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = self.to_json(pretty)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, json)?;
        fs::rename(&staging, path)?;

        info!("Readiness report written to: {}", path.display());
        Ok(())
    }
}
