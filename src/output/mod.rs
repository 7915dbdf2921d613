mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::PhaseProgress;
use styling::{dim, magenta_bold};
pub use summary::print_summary;

/// Prints the preflight banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🛫 preflight"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI Workflow Readiness Check")
    );
}
