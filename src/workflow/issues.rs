use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::report::serialize_path;

use super::document::{Job, PipelineDocument, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    UnpinnedVersion,
    UnstableBranch,
    ExcessiveStepCount,
}

impl IssueKind {
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::UnpinnedVersion => "unpinned-version",
            IssueKind::UnstableBranch => "unstable-branch",
            IssueKind::ExcessiveStepCount => "excessive-step-count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

/// A risky authoring pattern found in one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(serialize_with = "serialize_path")]
    pub document_path: PathBuf,
    pub job_name: String,
    pub kind: IssueKind,
    pub message: String,
    pub severity: Severity,
}

/// Secrets referenced by one job. Informational, never an [`Issue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretUsage {
    #[serde(serialize_with = "serialize_path")]
    pub document_path: PathBuf,
    pub job_name: String,
    pub names: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub issues: Vec<Issue>,
    pub secrets: Vec<SecretUsage>,
}

/// Syntactic checks over the jobs and steps of a typed workflow.
#[derive(Debug, Clone)]
pub struct IssueDetector {
    max_steps_per_job: usize,
    unstable_branches: Vec<String>,
}

impl Default for IssueDetector {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl IssueDetector {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            max_steps_per_job: config.max_steps_per_job,
            unstable_branches: config.unstable_branches.clone(),
        }
    }

    /// Walks every job in declared order and reports what it finds.
    ///
    /// Step rules run first, in step order; the step-count rule is checked once
    /// per job after them. Nothing here interprets what an action does.
    pub fn detect(&self, document: &PipelineDocument) -> Detection {
        let mut detection = Detection::default();

        for job in &document.jobs {
            debug!(
                "{}: job {} on {}",
                document.name,
                job.name,
                job.runs_on.as_deref().unwrap_or("unspecified runner")
            );

            let issue = |kind, severity, message| Issue {
                document_path: document.path.clone(),
                job_name: job.name.clone(),
                kind,
                message,
                severity,
            };

            for action in job.steps.iter().filter_map(|step| step.uses.as_deref()) {
                if let Some((kind, message)) = self.check_action(action) {
                    detection.issues.push(issue(kind, Severity::Warning, message));
                }
            }

            if job.steps.len() > self.max_steps_per_job {
                detection.issues.push(issue(
                    IssueKind::ExcessiveStepCount,
                    Severity::Info,
                    format!(
                        "High step count ({}) - consider job splitting",
                        job.steps.len()
                    ),
                ));
            }

            let names = referenced_secrets(job);
            if !names.is_empty() {
                detection.secrets.push(SecretUsage {
                    document_path: document.path.clone(),
                    job_name: job.name.clone(),
                    names,
                });
            }
        }

        detection
    }

    fn check_action(&self, action: &str) -> Option<(IssueKind, String)> {
        // Local actions live in the repository and carry no version
        if action.starts_with("./") {
            return None;
        }

        match action.rsplit_once('@') {
            None => Some((
                IssueKind::UnpinnedVersion,
                format!("Action without version: {action}"),
            )),
            Some((_, version)) if self.unstable_branches.iter().any(|b| b == version) => Some((
                IssueKind::UnstableBranch,
                format!("Using unstable branch: {action}"),
            )),
            Some(_) => None,
        }
    }
}

/// Secret names read inside any `${{ ... }}` expression of the job.
fn referenced_secrets(job: &Job) -> BTreeSet<String> {
    static EXPRESSION_RE: OnceLock<Regex> = OnceLock::new();
    static SECRET_RE: OnceLock<Regex> = OnceLock::new();

    let expression_re =
        EXPRESSION_RE.get_or_init(|| Regex::new(r"\$\{\{(.*?)\}\}").expect("expression regex"));
    let secret_re = SECRET_RE.get_or_init(|| {
        Regex::new(r"(?:^|[^A-Za-z0-9_.])secrets\.([A-Za-z_][A-Za-z0-9_]*)").expect("secret regex")
    });

    job.env
        .values()
        .map(String::as_str)
        .chain(job.steps.iter().flat_map(Step::texts))
        .flat_map(|text| expression_re.captures_iter(text))
        .filter_map(|expression| expression.get(1))
        .flat_map(|body| secret_re.captures_iter(body.as_str()))
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
        .collect()
}
