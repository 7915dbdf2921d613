use std::fmt::Write;
use std::path::Path;

use comfy_table::{Cell, Color as TableColor};

use crate::probe::CheckKind;
use crate::report::{ReadinessReport, ReadinessStatus};

use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim};
use super::tables::{advisory_cell, create_table, header, outcome_cell, severity_cell};

/// Prints a human-readable readiness summary to stdout.
///
/// Sections, in order:
/// - Overview: workflow directory, file counts, overall status
/// - Workflows: parse result, missing fields, job and step counts per file,
///   then triggers and the runner and env var count of every job
/// - Issues: every detected authoring issue, in file and job order
/// - Secrets: secret names each job references
/// - Environment: tool and critical file availability
/// - Simulation: outcome of each verification step
/// - Final status with next steps
pub fn print_summary(report: &ReadinessReport) {
    println!("{}", render_summary(report));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[allow(clippy::too_many_lines)]
fn render_summary(report: &ReadinessReport) -> String {
    let mut output = String::new();

    let valid = report.validations.iter().filter(|v| v.is_valid()).count();
    let status = match report.status {
        ReadinessStatus::Ready => bright_green("ready"),
        ReadinessStatus::IssuesDetected => bright_red("issues detected"),
    };

    // Overview
    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        dim("Workflow directory:"),
        cyan(report.root.display()),
        dim("Valid workflows:"),
        bright_yellow(format!("{valid}/{}", report.validations.len())),
        dim("Issues found:"),
        bright_yellow(report.issues.len()),
        dim("Status:"),
        status,
        dim("Generated:"),
        dim(report.timestamp.format("%Y-%m-%d %H:%M UTC"))
    );

    // Workflows
    add_section_header(&mut output, "📁", "Workflows");
    if report.validations.is_empty() {
        let _ = writeln!(output, "  {}\n", bright_yellow("No workflow files found."));
    } else {
        let mut table = create_table();
        table.set_header(header(&["File", "Parse", "Missing Fields", "Jobs", "Steps"]));
        for validation in &report.validations {
            let missing = if validation.missing_required_fields.is_empty() {
                Cell::new("-")
            } else {
                Cell::new(
                    validation
                        .missing_required_fields
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", "),
                )
                .fg(TableColor::Red)
            };
            table.add_row(vec![
                Cell::new(file_name(&validation.path)),
                outcome_cell(validation.parse_succeeded, "ok", "failed"),
                missing,
                Cell::new(validation.job_count),
                Cell::new(validation.step_count),
            ]);
        }
        let _ = writeln!(output, "{table}\n");

        for failed in report.validations.iter().filter(|v| !v.parse_succeeded) {
            let _ = writeln!(
                output,
                "  {} {}: {}",
                bright_red("✗"),
                file_name(&failed.path),
                dim(failed.error.as_deref().unwrap_or("unknown error"))
            );
        }
    }

    if !report.workflows.is_empty() {
        for workflow in &report.workflows {
            let triggers = if workflow.triggers.is_empty() {
                "none".to_string()
            } else {
                workflow.triggers.join(", ")
            };
            let _ = writeln!(
                output,
                "  {} {} {}",
                cyan(file_name(&workflow.path)),
                dim("triggers:"),
                triggers
            );
        }
        output.push('\n');

        let mut table = create_table();
        table.set_header(header(&["Workflow", "Job", "Runner", "Env Vars", "Steps"]));
        for workflow in &report.workflows {
            for job in &workflow.jobs {
                let runner = match &job.runner {
                    Some(runner) => Cell::new(runner),
                    None => Cell::new("not specified").fg(TableColor::Yellow),
                };
                table.add_row(vec![
                    Cell::new(file_name(&workflow.path)),
                    Cell::new(&job.name),
                    runner,
                    Cell::new(job.env_count),
                    Cell::new(job.step_count),
                ]);
            }
        }
        let _ = writeln!(output, "{table}\n");
    }

    // Issues
    add_section_header(&mut output, "⚠️", "Issues");
    if report.issues.is_empty() {
        let _ = writeln!(output, "  {}\n", bright_green("No issues detected"));
    } else {
        let mut table = create_table();
        table.set_header(header(&["File", "Job", "Kind", "Severity", "Message"]));
        for issue in &report.issues {
            table.add_row(vec![
                Cell::new(file_name(&issue.document_path)),
                Cell::new(&issue.job_name),
                Cell::new(issue.kind.label()),
                severity_cell(issue.severity),
                Cell::new(&issue.message),
            ]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    // Secrets
    if !report.secrets.is_empty() {
        add_section_header(&mut output, "🔐", "Secrets");
        for usage in &report.secrets {
            let names: Vec<&str> = usage.names.iter().map(String::as_str).collect();
            let _ = writeln!(
                output,
                "  {} {} {}",
                cyan(format!("{}:{}", file_name(&usage.document_path), usage.job_name)),
                dim("uses"),
                names.join(", ")
            );
        }
        output.push('\n');
    }

    // Environment
    add_section_header(&mut output, "🔧", "Environment");
    let mut table = create_table();
    table.set_header(header(&["Check", "Kind", "Status"]));
    for check in &report.environment {
        let (kind, pass, fail) = match check.kind {
            CheckKind::Tool => ("tool", "available", "missing"),
            CheckKind::File => ("file", "present", "missing"),
        };
        table.add_row(vec![
            Cell::new(&check.tool_name),
            Cell::new(kind),
            outcome_cell(check.available, pass, fail),
        ]);
    }
    let _ = writeln!(output, "{table}\n");

    // Simulation
    add_section_header(&mut output, "🚀", "Simulation");
    let mut table = create_table();
    table.set_header(header(&["Step", "Gates Status", "Result"]));
    for step in &report.simulation {
        let result = if step.advisory {
            advisory_cell(step.succeeded)
        } else {
            outcome_cell(step.succeeded, "passed", "failed")
        };
        table.add_row(vec![
            Cell::new(&step.name),
            Cell::new(if step.advisory { "no" } else { "yes" }),
            result,
        ]);
    }
    let _ = writeln!(output, "{table}\n");

    // Final status
    add_section_header(&mut output, "🎯", "Final Status");
    match report.status {
        ReadinessStatus::Ready => {
            let _ = writeln!(
                output,
                "  {}",
                bright_green("All systems ready: workflows should run as written")
            );
        }
        ReadinessStatus::IssuesDetected => {
            let _ = writeln!(
                output,
                "  {}\n\
                 \x20 {} Fix workflows with parse errors or missing fields\n\
                 \x20 {} Install missing tools and restore missing files\n\
                 \x20 {} Make type-check and lint pass locally",
                bright_red("Some issues detected"),
                cyan("•"),
                cyan("•"),
                cyan("•")
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::EnvironmentCheck;
    use crate::simulate::SimulationStep;
    use crate::workflow::{
        Issue, IssueKind, JobOverview, SecretUsage, Severity, ValidationResult, WorkflowOverview,
    };
    use chrono::Utc;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn create_test_report(status: ReadinessStatus) -> ReadinessReport {
        ReadinessReport {
            timestamp: Utc::now(),
            root: PathBuf::from(".github/workflows"),
            validations: vec![
                ValidationResult {
                    path: PathBuf::from(".github/workflows/ci.yml"),
                    parse_succeeded: true,
                    missing_required_fields: BTreeSet::new(),
                    job_count: 2,
                    step_count: 7,
                    error: None,
                },
                ValidationResult {
                    path: PathBuf::from(".github/workflows/nightly.yml"),
                    parse_succeeded: true,
                    missing_required_fields: BTreeSet::from(["jobs".to_string()]),
                    job_count: 0,
                    step_count: 0,
                    error: None,
                },
                ValidationResult::parse_failure(
                    &PathBuf::from(".github/workflows/broken.yml"),
                    "mapping values are not allowed here",
                ),
            ],
            workflows: vec![WorkflowOverview {
                path: PathBuf::from(".github/workflows/ci.yml"),
                name: "CI".to_string(),
                triggers: vec!["push".to_string(), "pull_request".to_string()],
                jobs: vec![
                    JobOverview {
                        name: "build".to_string(),
                        runner: Some("ubuntu-latest".to_string()),
                        env_count: 3,
                        step_count: 5,
                    },
                    JobOverview {
                        name: "deploy".to_string(),
                        runner: None,
                        env_count: 0,
                        step_count: 2,
                    },
                ],
            }],
            issues: vec![Issue {
                document_path: PathBuf::from(".github/workflows/ci.yml"),
                job_name: "build".to_string(),
                kind: IssueKind::UnstableBranch,
                message: "Using unstable branch: foo/bar@main".to_string(),
                severity: Severity::Warning,
            }],
            secrets: vec![SecretUsage {
                document_path: PathBuf::from(".github/workflows/ci.yml"),
                job_name: "deploy".to_string(),
                names: BTreeSet::from(["DEPLOY_KEY".to_string(), "NPM_TOKEN".to_string()]),
            }],
            environment: vec![
                EnvironmentCheck {
                    tool_name: "Node.js".to_string(),
                    kind: CheckKind::Tool,
                    available: true,
                },
                EnvironmentCheck {
                    tool_name: "ios/Podfile".to_string(),
                    kind: CheckKind::File,
                    available: false,
                },
            ],
            simulation: vec![
                SimulationStep {
                    name: "type-check".to_string(),
                    succeeded: true,
                    advisory: false,
                },
                SimulationStep {
                    name: "platform-files".to_string(),
                    succeeded: false,
                    advisory: true,
                },
            ],
            status,
        }
    }

    #[test]
    fn test_render_summary_sections() {
        let output = render_summary(&create_test_report(ReadinessStatus::IssuesDetected));

        assert!(output.contains("Overview"));
        assert!(output.contains(".github/workflows"));
        assert!(output.contains("1/3"));
        assert!(output.contains("Workflows"));
        assert!(output.contains("Issues"));
        assert!(output.contains("Environment"));
        assert!(output.contains("Simulation"));
        assert!(output.contains("Final Status"));
    }

    #[test]
    fn test_render_summary_lists_workflow_outcomes() {
        let output = render_summary(&create_test_report(ReadinessStatus::IssuesDetected));

        assert!(output.contains("ci.yml"));
        assert!(output.contains("nightly.yml"));
        assert!(output.contains("broken.yml"));
        assert!(output.contains("mapping values are not allowed here"));
    }

    #[test]
    fn test_render_summary_lists_triggers_and_jobs() {
        let output = render_summary(&create_test_report(ReadinessStatus::Ready));

        assert!(output.contains("push, pull_request"));
        assert!(output.contains("ubuntu-latest"));
        assert!(output.contains("not specified"));
        assert!(output.contains("Env Vars"));
        assert!(output.contains("deploy"));
    }

    #[test]
    fn test_render_summary_lists_issues_and_secrets() {
        let output = render_summary(&create_test_report(ReadinessStatus::IssuesDetected));

        assert!(output.contains("unstable-branch"));
        assert!(output.contains("Using unstable branch: foo/bar@main"));
        assert!(output.contains("warning"));
        assert!(output.contains("Secrets"));
        assert!(output.contains("DEPLOY_KEY, NPM_TOKEN"));
    }

    #[test]
    fn test_render_summary_environment_and_simulation() {
        let output = render_summary(&create_test_report(ReadinessStatus::IssuesDetected));

        assert!(output.contains("Node.js"));
        assert!(output.contains("ios/Podfile"));
        assert!(output.contains("type-check"));
        assert!(output.contains("advisory"));
    }

    #[test]
    fn test_render_summary_final_status() {
        let issues = render_summary(&create_test_report(ReadinessStatus::IssuesDetected));
        assert!(issues.contains("Some issues detected"));

        let ready = render_summary(&create_test_report(ReadinessStatus::Ready));
        assert!(ready.contains("All systems ready"));
    }

    #[test]
    fn test_render_summary_without_workflows_or_issues() {
        let mut report = create_test_report(ReadinessStatus::Ready);
        report.validations.clear();
        report.workflows.clear();
        report.issues.clear();
        report.secrets.clear();

        let output = render_summary(&report);

        assert!(output.contains("No workflow files found."));
        assert!(output.contains("No issues detected"));
        assert!(!output.contains("Secrets"));
    }
}
