use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::report::serialize_path;

/// Top-level keys every workflow must declare.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "on", "jobs"];

/// A workflow definition that passed structural validation.
///
/// Built once from the raw YAML in [`validate`]; downstream stages only ever
/// see this typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDocument {
    pub path: PathBuf,
    pub name: String,
    /// Event names from the `on` key, in declared order
    pub triggers: Vec<String>,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub runs_on: Option<String>,
    pub env: IndexMap<String, String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    pub name: Option<String>,
    /// External action reference, e.g. `actions/checkout@v4`
    pub uses: Option<String>,
    pub run: Option<String>,
    pub condition: Option<String>,
    pub with: IndexMap<String, String>,
    pub env: IndexMap<String, String>,
}

impl Step {
    /// Every string the step carries, in field order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.name
            .iter()
            .chain(&self.uses)
            .chain(&self.run)
            .chain(&self.condition)
            .chain(self.with.values())
            .chain(self.env.values())
            .map(String::as_str)
    }
}

impl PipelineDocument {
    /// The triggers and per-job layout shown for a valid workflow.
    pub fn overview(&self) -> WorkflowOverview {
        WorkflowOverview {
            path: self.path.clone(),
            name: self.name.clone(),
            triggers: self.triggers.clone(),
            jobs: self
                .jobs
                .iter()
                .map(|job| JobOverview {
                    name: job.name.clone(),
                    runner: job.runs_on.clone(),
                    env_count: job.env.len(),
                    step_count: job.steps.len(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOverview {
    #[serde(serialize_with = "serialize_path")]
    pub path: PathBuf,
    pub name: String,
    pub triggers: Vec<String>,
    pub jobs: Vec<JobOverview>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOverview {
    pub name: String,
    /// `None` when the job declares no `runs-on`
    pub runner: Option<String>,
    pub env_count: usize,
    pub step_count: usize,
}

/// Structural validation outcome for one workflow file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(serialize_with = "serialize_path")]
    pub path: PathBuf,
    pub parse_succeeded: bool,
    pub missing_required_fields: BTreeSet<String>,
    pub job_count: usize,
    pub step_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// A document that could not be read or parsed.
    pub fn parse_failure(path: &Path, error: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            parse_succeeded: false,
            missing_required_fields: BTreeSet::new(),
            job_count: 0,
            step_count: 0,
            error: Some(error.into()),
        }
    }

    /// Parsed and has every required field.
    pub fn is_valid(&self) -> bool {
        self.parse_succeeded && self.missing_required_fields.is_empty()
    }
}

#[derive(Deserialize)]
struct RawJob {
    #[serde(rename = "runs-on", default)]
    runs_on: Option<Value>,
    #[serde(default)]
    steps: Option<Vec<RawStep>>,
    #[serde(default)]
    env: Option<IndexMap<String, Value>>,
}

#[derive(Deserialize)]
struct RawStep {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    uses: Option<Value>,
    #[serde(default)]
    run: Option<Value>,
    #[serde(rename = "if", default)]
    condition: Option<Value>,
    #[serde(default)]
    with: Option<IndexMap<String, Value>>,
    #[serde(default)]
    env: Option<IndexMap<String, Value>>,
}

/// Parses a workflow file and checks its required top-level fields.
///
/// Never fails: parse errors and missing fields are recorded in the returned
/// [`ValidationResult`]. A typed [`PipelineDocument`] is only produced when the
/// text parsed and every field in [`REQUIRED_FIELDS`] is present.
pub fn validate(path: &Path, text: &str) -> (ValidationResult, Option<PipelineDocument>) {
    let value: Value = match serde_yaml::from_str(text) {
        Ok(value) => value,
        Err(err) => return (ValidationResult::parse_failure(path, err.to_string()), None),
    };

    let empty = Mapping::new();
    let mapping = value.as_mapping().unwrap_or(&empty);

    let missing_required_fields: BTreeSet<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !mapping.contains_key(**field))
        .map(ToString::to_string)
        .collect();

    let jobs = match mapping.get("jobs").map(convert_jobs).transpose() {
        Ok(jobs) => jobs,
        Err(err) => {
            let message = format!("invalid jobs section: {err}");
            return (ValidationResult::parse_failure(path, message), None);
        }
    };

    let job_count = jobs.as_ref().map_or(0, Vec::len);
    let step_count = jobs
        .iter()
        .flatten()
        .map(|job| job.steps.len())
        .sum();

    let result = ValidationResult {
        path: path.to_path_buf(),
        parse_succeeded: true,
        missing_required_fields,
        job_count,
        step_count,
        error: None,
    };

    if !result.missing_required_fields.is_empty() {
        return (result, None);
    }

    let document = PipelineDocument {
        path: path.to_path_buf(),
        name: mapping.get("name").and_then(text_of).unwrap_or_default(),
        triggers: mapping.get("on").map(trigger_names).unwrap_or_default(),
        jobs: jobs.unwrap_or_default(),
    };

    (result, Some(document))
}

fn convert_jobs(value: &Value) -> Result<Vec<Job>, serde_yaml::Error> {
    if value.is_null() {
        return Ok(Vec::new());
    }

    let raw: IndexMap<String, RawJob> = serde_yaml::from_value(value.clone())?;

    Ok(raw
        .into_iter()
        .map(|(name, job)| Job {
            name,
            runs_on: job.runs_on.as_ref().and_then(runner_label),
            env: text_map(job.env),
            steps: job
                .steps
                .unwrap_or_default()
                .into_iter()
                .map(convert_step)
                .collect(),
        })
        .collect())
}

fn convert_step(raw: RawStep) -> Step {
    Step {
        name: raw.name.as_ref().and_then(text_of),
        uses: raw.uses.as_ref().and_then(text_of),
        run: raw.run.as_ref().and_then(text_of),
        condition: raw.condition.as_ref().and_then(text_of),
        with: text_map(raw.with),
        env: text_map(raw.env),
    }
}

fn text_map(raw: Option<IndexMap<String, Value>>) -> IndexMap<String, String> {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| text_of(&value).map(|text| (key, text)))
        .collect()
}

/// Renders a YAML value as the text a workflow author wrote.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => text_of(&tagged.value),
        other => serde_yaml::to_string(other)
            .ok()
            .map(|text| text.trim_end().to_string()),
    }
}

fn runner_label(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(labels) => {
            let labels: Vec<String> = labels.iter().filter_map(text_of).collect();
            (!labels.is_empty()).then(|| labels.join(", "))
        }
        other => text_of(other),
    }
}

fn trigger_names(value: &Value) -> Vec<String> {
    match value {
        Value::Mapping(events) => events.keys().filter_map(text_of).collect(),
        Value::Sequence(events) => events.iter().filter_map(text_of).collect(),
        other => text_of(other).into_iter().collect(),
    }
}
