mod discovery;
mod document;
mod issues;

use std::path::Path;

use log::{debug, warn};

pub use discovery::discover;
pub use document::{ValidationResult, WorkflowOverview};
#[cfg(test)]
pub use document::JobOverview;
use document::{validate, PipelineDocument};
pub use issues::{Detection, Issue, IssueDetector, IssueKind, SecretUsage, Severity};

/// Everything learned about one workflow file.
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub validation: ValidationResult,
    /// Present only for documents that passed validation
    pub overview: Option<WorkflowOverview>,
    pub detection: Detection,
}

/// Validates one workflow file and, when it is structurally sound, runs the
/// issue detector over it.
///
/// A file that cannot be read is recorded as a parse failure rather than
/// aborting the run.
pub fn analyze_document(path: &Path, detector: &IssueDetector) -> DocumentAnalysis {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!("Failed to read {}: {err}", path.display());
            return DocumentAnalysis {
                validation: ValidationResult::parse_failure(path, err.to_string()),
                overview: None,
                detection: Detection::default(),
            };
        }
    };

    let (validation, document) = validate(path, &text);

    if !validation.parse_succeeded {
        warn!(
            "{}: parse failed: {}",
            path.display(),
            validation.error.as_deref().unwrap_or("unknown error")
        );
    } else if !validation.missing_required_fields.is_empty() {
        warn!(
            "{}: missing required fields: {:?}",
            path.display(),
            validation.missing_required_fields
        );
    }

    let overview = document.as_ref().map(PipelineDocument::overview);
    if let Some(overview) = &overview {
        debug!(
            "{}: workflow {:?} triggered by {}",
            path.display(),
            overview.name,
            overview.triggers.join(", ")
        );
    }

    let detection = document
        .as_ref()
        .map(|document| detector.detect(document))
        .unwrap_or_default();

    debug!(
        "{}: {} jobs, {} steps, {} issues",
        path.display(),
        validation.job_count,
        validation.step_count,
        detection.issues.len()
    );

    DocumentAnalysis {
        validation,
        overview,
        detection,
    }
}
