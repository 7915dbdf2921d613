use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;

use crate::config::Config;
use crate::error::Result;
use crate::output::PhaseProgress;
use crate::probe::EnvironmentProbe;
use crate::report::ReadinessReport;
use crate::simulate::StepSimulator;
use crate::workflow::{analyze_document, discover, IssueDetector};

/// One readiness run: workflows, environment, simulation, aggregation.
///
/// Holds no state between runs. Persisting the report is left to the caller
/// so that a fatal error never leaves a report behind.
pub struct Preflight {
    root: PathBuf,
    detector: IssueDetector,
    probe: EnvironmentProbe,
    simulator: StepSimulator,
    show_progress: bool,
}

impl Preflight {
    pub fn new(
        root: PathBuf,
        detector: IssueDetector,
        probe: EnvironmentProbe,
        simulator: StepSimulator,
    ) -> Self {
        Self {
            root,
            detector,
            probe,
            simulator,
            show_progress: false,
        }
    }

    /// Wires every stage from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self::new(
            config.workflow_dir.clone(),
            IssueDetector::from_config(&config.analysis),
            EnvironmentProbe::from_config(config)?,
            StepSimulator::from_config(config)?,
        ))
    }

    /// Draw the phase spinner on stderr while running.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs every stage and returns the aggregated report.
    ///
    /// # Errors
    ///
    /// Returns `RootNotFound` before any probe or command runs if the workflow
    /// directory is missing. Every other failure is recorded in the report.
    pub async fn run(&self) -> Result<ReadinessReport> {
        let paths = discover(&self.root)?;
        info!(
            "Found {} workflow files in {}",
            paths.len(),
            self.root.display()
        );

        let progress = self
            .show_progress
            .then(|| PhaseProgress::start_workflows(paths.len()));

        let analyses: Vec<_> = paths
            .iter()
            .map(|path| analyze_document(path, &self.detector))
            .collect();

        let progress = progress.map(PhaseProgress::finish_workflows_start_environment);
        let environment = self.probe.run().await;

        let progress = progress.map(PhaseProgress::finish_environment_start_simulation);
        let simulation = self.simulator.run().await;

        if let Some(progress) = progress {
            progress.finish_simulation();
        }

        Ok(ReadinessReport::assemble(
            &self.root,
            analyses,
            environment,
            simulation,
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreflightError;
    use crate::probe::{CapabilityCheck, FixedCheck};
    use crate::report::ReadinessStatus;
    use crate::workflow::IssueKind;
    use std::fs;

    const CI: &str = r#"
name: CI
on: [push]
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - uses: oven-sh/setup-bun@main
      - run: bun install
        env:
          TOKEN: ${{ secrets.NPM_TOKEN }}
"#;

    const RELEASE: &str = r#"
name: Release
on:
  push:
    tags: ["v*"]
jobs:
  publish:
    steps:
      - uses: softprops/action-gh-release
"#;

    fn fixed(name: &str, outcome: bool) -> Box<dyn CapabilityCheck> {
        Box::new(FixedCheck::new(name, outcome))
    }

    fn preflight(root: &Path, tools_ok: bool, lint_ok: bool) -> Preflight {
        Preflight::new(
            root.to_path_buf(),
            IssueDetector::default(),
            EnvironmentProbe::new(
                vec![fixed("Node.js", tools_ok)],
                vec![fixed("package.json", true)],
            ),
            StepSimulator::new([
                fixed("tsc", true),
                fixed("eslint", lint_ok),
                fixed("deps", false),
                fixed("ios", false),
            ]),
        )
    }

    fn workflow_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, text) in files {
            fs::write(dir.path().join(name), text).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn clean_inputs_are_ready_despite_issues() {
        let dir = workflow_dir(&[("ci.yml", CI), ("release.yml", RELEASE)]);

        let report = preflight(dir.path(), true, true).run().await.unwrap();

        assert_eq!(report.status, ReadinessStatus::Ready);
        assert_eq!(report.validations.len(), 2);
        assert!(report.validations[0].path.ends_with("ci.yml"));
        assert!(report.validations[1].path.ends_with("release.yml"));

        let kinds: Vec<_> = report.issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::UnstableBranch, IssueKind::UnpinnedVersion]
        );

        assert_eq!(report.secrets.len(), 1);
        assert!(report.secrets[0].names.contains("NPM_TOKEN"));

        assert_eq!(report.workflows.len(), 2);
        assert_eq!(report.workflows[0].jobs[0].runner.as_deref(), Some("ubuntu-latest"));
        assert_eq!(report.workflows[1].triggers, vec!["push"]);
        assert_eq!(report.workflows[1].jobs[0].runner, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_workflow_is_validated() {
        let dir = workflow_dir(&[("shared.txt", CI)]);
        std::os::unix::fs::symlink(dir.path().join("shared.txt"), dir.path().join("ci.yml"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling.yml"))
            .unwrap();

        let report = preflight(dir.path(), true, true).run().await.unwrap();

        assert_eq!(report.validations.len(), 2);
        assert!(report.validations[0].is_valid());
        assert!(report.validations[0].path.ends_with("ci.yml"));
        assert!(!report.validations[1].parse_succeeded);
        assert_eq!(report.status, ReadinessStatus::IssuesDetected);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn non_utf8_file_name_still_produces_a_report() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = workflow_dir(&[]);
        let root = dir.path().join("workflows");
        fs::create_dir(&root).unwrap();
        fs::write(root.join(OsStr::from_bytes(b"bad\xff.yml")), CI).unwrap();

        let report = preflight(&root, true, true).run().await.unwrap();
        assert_eq!(report.validations.len(), 1);

        let report_path = dir.path().join("readiness_report.json");
        report.persist(&report_path, true).unwrap();
        assert!(fs::read_to_string(&report_path).unwrap().contains("bad\u{FFFD}.yml"));
    }

    #[tokio::test]
    async fn lint_failure_alone_flips_status() {
        let dir = workflow_dir(&[("ci.yml", CI)]);
        let report = preflight(dir.path(), true, false).run().await.unwrap();
        assert_eq!(report.status, ReadinessStatus::IssuesDetected);
    }

    #[tokio::test]
    async fn missing_tool_alone_flips_status() {
        let dir = workflow_dir(&[("ci.yml", CI)]);
        let report = preflight(dir.path(), false, true).run().await.unwrap();
        assert_eq!(report.status, ReadinessStatus::IssuesDetected);
    }

    #[tokio::test]
    async fn broken_document_is_recorded_and_run_continues() {
        let dir = workflow_dir(&[
            ("a-broken.yml", "name: [oops\n"),
            ("b-incomplete.yml", "name: X\non: push\n"),
            ("c-ci.yml", CI),
        ]);

        let report = preflight(dir.path(), true, true).run().await.unwrap();

        assert_eq!(report.validations.len(), 3);
        assert!(!report.validations[0].parse_succeeded);
        assert!(report.validations[1].missing_required_fields.contains("jobs"));
        assert!(report.validations[2].is_valid());
        assert_eq!(report.environment.len(), 2);
        assert_eq!(report.simulation.len(), 4);
        assert_eq!(report.status, ReadinessStatus::IssuesDetected);
    }

    #[tokio::test]
    async fn rerun_is_identical_except_timestamp() {
        let dir = workflow_dir(&[("ci.yml", CI), ("release.yml", RELEASE)]);
        let preflight = preflight(dir.path(), true, false);

        let first = preflight.run().await.unwrap();
        let mut second = preflight.run().await.unwrap();
        second.timestamp = first.timestamp;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_root_aborts_without_report() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(".github").join("workflows");
        let report_path = dir.path().join("readiness_report.json");

        let result = preflight(&root, true, true).run().await;

        assert!(matches!(result, Err(PreflightError::RootNotFound(_))));
        assert!(!report_path.exists());
    }

    #[test]
    fn from_config_rejects_invalid_config() {
        let mut config = Config::default();
        config.analysis.max_steps_per_job = 0;
        assert!(Preflight::from_config(&config).is_err());
    }
}
