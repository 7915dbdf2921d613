use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use crate::config::Config;
use crate::output::print_summary;
use crate::pipeline::Preflight;

/// Exit status when the report says `issues_detected`.
const ISSUES_DETECTED_EXIT: u8 = 2;

#[derive(Parser)]
#[command(name = "preflight")]
#[command(author, version, about = "CI Workflow Readiness Check", long_about = None)]
pub struct Cli {
    /// Workflow directory (defaults to .github/workflows)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Where to write the readiness report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (defaults to ./preflight.{toml,json,yaml,yml})
    #[arg(short, long, env = "PREFLIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum steps per job before an excessive-step-count issue
    #[arg(long)]
    max_steps: Option<usize>,

    /// Per-command timeout in seconds (0 waits forever)
    #[arg(long)]
    timeout: Option<u64>,

    /// What to print on stdout
    #[arg(short, long, value_enum, default_value_t = Format::Summary)]
    format: Format,

    #[arg(short, long, default_value_t = false)]
    pretty: bool,

    /// Exit with status 0 even when issues are detected
    #[arg(long, default_value_t = false)]
    no_fail: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Summary,
    Json,
}

impl Cli {
    /// Loads the config file and applies command-line overrides on top.
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(root) = &self.root {
            config.workflow_dir = root.clone();
        }
        if let Some(output) = &self.output {
            config.report_path = output.clone();
        }
        if let Some(max_steps) = self.max_steps {
            config.analysis.max_steps_per_job = max_steps;
        }
        if let Some(timeout) = self.timeout {
            config.environment.timeout_secs = timeout;
        }

        Ok(config)
    }

    pub async fn execute(&self) -> Result<ExitCode> {
        let config = self.resolve_config()?;

        let preflight = Preflight::from_config(&config)
            .context("Invalid preflight configuration")?
            .with_progress(self.format == Format::Summary);

        info!(
            "Checking readiness of workflows in: {}",
            preflight.root().display()
        );

        let report = preflight.run().await.context("Readiness run aborted")?;

        report
            .persist(&config.report_path, self.pretty)
            .with_context(|| {
                format!(
                    "Failed to write readiness report: {}",
                    config.report_path.display()
                )
            })?;

        match self.format {
            Format::Summary => print_summary(&report),
            Format::Json => println!("{}", report.to_json(self.pretty)?),
        }

        if report.status.is_ready() || self.no_fail {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::from(ISSUES_DETECTED_EXIT))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["preflight"]).unwrap();
        assert_eq!(cli.format, Format::Summary);
        assert!(!cli.pretty);
        assert!(!cli.no_fail);
        assert!(cli.root.is_none());
    }

    #[test]
    fn test_overrides_apply_on_top_of_config_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            file,
            r#"
workflow-dir = "from-file"
report-path = "file-report.json"

[analysis]
max-steps-per-job = 7
"#
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "preflight",
            "--config",
            file.path().to_str().unwrap(),
            "--root",
            "ci/workflows",
            "--timeout",
            "45",
            "--format",
            "json",
            "--no-fail",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.workflow_dir, PathBuf::from("ci/workflows"));
        assert_eq!(config.report_path, PathBuf::from("file-report.json"));
        assert_eq!(config.analysis.max_steps_per_job, 7);
        assert_eq!(config.environment.timeout_secs, 45);
        assert_eq!(cli.format, Format::Json);
        assert!(cli.no_fail);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["preflight", "--format", "xml"]).is_err());
    }

    #[tokio::test]
    async fn test_missing_root_fails_without_writing_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.json");
        let config = dir.path().join("preflight.toml");
        std::fs::write(&config, "").unwrap();

        let cli = Cli::try_parse_from([
            "preflight",
            "--config",
            config.to_str().unwrap(),
            "--root",
            dir.path().join("missing").to_str().unwrap(),
            "--output",
            report.to_str().unwrap(),
            "--format",
            "json",
        ])
        .unwrap();

        let err = cli.execute().await.unwrap_err();
        assert!(format!("{err:#}").contains("Workflow directory not found"));
        assert!(!report.exists());
    }
}
