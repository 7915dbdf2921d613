use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Spinner for the three stages of a readiness run
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_workflows(file_count: usize) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let pb = create_spinner(
            bright_yellow(format!("Phase 1/3: Analyzing {file_count} workflow files")).to_string(),
        );
        Self { pb }
    }

    pub fn finish_workflows_start_environment(self) -> Self {
        self.pb
            .finish_with_message(bright_green("Phase 1/3: Workflows analyzed ✓").to_string());
        let pb = create_spinner(bright_yellow("Phase 2/3: Probing environment").to_string());
        Self { pb }
    }

    pub fn finish_environment_start_simulation(self) -> Self {
        self.pb
            .finish_with_message(bright_green("Phase 2/3: Environment probed ✓").to_string());
        let pb = create_spinner(bright_yellow("Phase 3/3: Simulating build steps").to_string());
        Self { pb }
    }

    pub fn finish_simulation(self) {
        self.pb.finish_with_message(
            bright_green("Phase 3/3: Build steps simulated ✓").to_string(),
        );
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
