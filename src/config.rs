use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PreflightError;

/// Configuration file structure for preflight.
///
/// Built once at startup (file values, then CLI overrides) and passed by
/// reference to every stage. Nothing reads process-wide state after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Directory holding the workflow definitions
    #[serde(default = "default_workflow_dir")]
    pub workflow_dir: PathBuf,

    /// Where the readiness report is written
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,

    /// Directory that probes and verification commands run in (defaults to the current one)
    pub project_dir: Option<PathBuf>,

    /// Workflow analysis thresholds
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Tool and file probes
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Local verification steps
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Jobs with more steps than this get an excessive-step-count issue
    #[serde(default = "default_max_steps_per_job")]
    pub max_steps_per_job: usize,

    /// Version suffixes that name a moving branch rather than a tag or SHA
    #[serde(default = "default_unstable_branches")]
    pub unstable_branches: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolConfig {
    /// Display name (e.g. "Node.js")
    pub name: String,

    /// Command whose zero exit status means the tool is available
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnvironmentConfig {
    /// Files that must exist for the workflows to run
    #[serde(default = "default_critical_paths")]
    pub critical_paths: Vec<PathBuf>,

    /// Per-command timeout in seconds, 0 waits forever
    #[serde(default)]
    pub timeout_secs: u64,

    #[serde(default = "default_tools")]
    pub tools: Vec<ToolConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulationConfig {
    #[serde(default = "default_type_check")]
    pub type_check: Vec<String>,

    #[serde(default = "default_lint")]
    pub lint: Vec<String>,

    #[serde(default = "default_dependency_manifest")]
    pub dependency_manifest: PathBuf,

    #[serde(default = "default_dependency_dir")]
    pub dependency_dir: PathBuf,

    #[serde(default = "default_platform_files")]
    pub platform_files: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workflow_dir: default_workflow_dir(),
            report_path: default_report_path(),
            project_dir: None,
            analysis: AnalysisConfig::default(),
            environment: EnvironmentConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_steps_per_job: default_max_steps_per_job(),
            unstable_branches: default_unstable_branches(),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            critical_paths: default_critical_paths(),
            timeout_secs: 0,
            tools: default_tools(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            type_check: default_type_check(),
            lint: default_lint(),
            dependency_manifest: default_dependency_manifest(),
            dependency_dir: default_dependency_dir(),
            platform_files: default_platform_files(),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}

fn default_workflow_dir() -> PathBuf {
    PathBuf::from(".github/workflows")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("readiness_report.json")
}

fn default_max_steps_per_job() -> usize {
    20
}

fn default_unstable_branches() -> Vec<String> {
    argv(&["main", "master"])
}

fn default_tools() -> Vec<ToolConfig> {
    [
        ("Node.js", argv(&["node", "--version"])),
        ("Bun", argv(&["bun", "--version"])),
        ("TypeScript", argv(&["bunx", "tsc", "--version"])),
        ("Python", argv(&["python3", "--version"])),
        ("Git", argv(&["git", "--version"])),
        (
            "Metro Bundler",
            argv(&["curl", "-s", "http://localhost:8081/status"]),
        ),
    ]
    .into_iter()
    .map(|(name, command)| ToolConfig {
        name: name.to_string(),
        command,
    })
    .collect()
}

fn default_critical_paths() -> Vec<PathBuf> {
    [
        "package.json",
        "src/api/core-ml-service.ts",
        "src/api/native-llm-service.ts",
        "src/api/dev-llm-service.ts",
        "ios/LocalLLMModule/LocalLLMModule.swift",
        "ios/LocalLLMModule/LocalLLMModule.m",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

fn default_type_check() -> Vec<String> {
    argv(&["bunx", "tsc", "--noEmit", "--skipLibCheck"])
}

fn default_lint() -> Vec<String> {
    argv(&["bunx", "eslint", "src/**/*.{ts,tsx}", "--max-warnings", "50"])
}

fn default_dependency_manifest() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_dependency_dir() -> PathBuf {
    PathBuf::from("node_modules")
}

fn default_platform_files() -> Vec<PathBuf> {
    [
        "ios/LocalLLMModule/LocalLLMModule.swift",
        "ios/LocalLLMModule/LocalLLMModule.m",
        "ios/Podfile",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./preflight.toml
    /// 3. ./preflight.json
    /// 4. ./preflight.yaml
    /// 5. ./preflight.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "preflight.toml",
            "preflight.json",
            "preflight.yaml",
            "preflight.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Rejects settings that would make a run meaningless.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.analysis.max_steps_per_job == 0 {
            return Err(PreflightError::Config(
                "max-steps-per-job must be at least 1".to_string(),
            ));
        }

        if let Some(tool) = self.environment.tools.iter().find(|t| t.command.is_empty()) {
            return Err(PreflightError::Config(format!(
                "tool '{}' has an empty command",
                tool.name
            )));
        }

        if self.simulation.type_check.is_empty() {
            return Err(PreflightError::Config(
                "simulation type-check command is empty".to_string(),
            ));
        }

        if self.simulation.lint.is_empty() {
            return Err(PreflightError::Config(
                "simulation lint command is empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Timeout applied to every probe and simulation command.
    pub fn probe_timeout(&self) -> Option<std::time::Duration> {
        match self.environment.timeout_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}
