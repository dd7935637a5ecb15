//! # Data Models Module
//!
//! This module defines the normalized data structures produced by the
//! aggregator and the consolidator: scenario and step results, run-level
//! metrics, and the per-module outcomes the orchestrator collects.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::core::evidence::StepEvidence;
use crate::core::raw::StepStatus;
use crate::infra::t;

/// The derived verdict of a scenario. Engine statuses such as `undefined`
/// fold into `Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Passed => "passed",
            ScenarioStatus::Failed => "failed",
            ScenarioStatus::Skipped => "skipped",
        }
    }

    /// Gets the status as a localized string for display.
    pub fn label(&self, locale: &str) -> String {
        match self {
            ScenarioStatus::Passed => t!("report.status_passed", locale = locale).to_string(),
            ScenarioStatus::Failed => t!("report.status_failed", locale = locale).to_string(),
            ScenarioStatus::Skipped => t!("report.status_skipped", locale = locale).to_string(),
        }
    }

    /// Gets the CSS class used by the HTML report.
    pub fn css_class(&self) -> &'static str {
        match self {
            ScenarioStatus::Passed => "status-passed",
            ScenarioStatus::Failed => "status-failed",
            ScenarioStatus::Skipped => "status-skipped",
        }
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload of a failed scenario, taken from its first failed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_keyword: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDetail {
    pub name: String,
    pub keyword: String,
    pub status: StepStatus,
    /// Unrounded; reports present it with three decimals.
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub evidence: StepEvidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScenarioResult {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: ScenarioStatus,
    /// Sum of the step durations, unrounded.
    pub duration_seconds: f64,
    #[serde(default)]
    pub steps: Vec<StepDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ScenarioError>,
    #[serde(default)]
    pub evidence_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Owning module; attached during consolidation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

/// Where and by what a report was generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub platform: String,
    pub arch: String,
    pub runner_version: String,
    pub working_directory: String,
    pub timestamp: DateTime<Local>,
}

impl EnvironmentInfo {
    pub fn capture(timestamp: DateTime<Local>) -> Self {
        let working_directory = std::env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            runner_version: env!("CARGO_PKG_VERSION").to_string(),
            working_directory,
            timestamp,
        }
    }
}

/// Run-level counters and timings. Always rebuilt from a scenario list,
/// never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_duration_seconds: f64,
    pub average_duration_seconds: f64,
    pub generation_timestamp: DateTime<Local>,
    pub environment: EnvironmentInfo,
}

impl AggregateMetrics {
    pub fn from_scenarios(
        scenarios: &[NormalizedScenarioResult],
        generated_at: DateTime<Local>,
    ) -> Self {
        let count = |status: ScenarioStatus| scenarios.iter().filter(|s| s.status == status).count();
        let total = scenarios.len();
        let duration: f64 = scenarios.iter().map(|s| s.duration_seconds).sum();
        let average = if total > 0 {
            round_to(duration / total as f64, 2)
        } else {
            0.0
        };

        Self {
            total,
            passed: count(ScenarioStatus::Passed),
            failed: count(ScenarioStatus::Failed),
            skipped: count(ScenarioStatus::Skipped),
            total_duration_seconds: round_to(duration, 2),
            average_duration_seconds: average,
            generation_timestamp: generated_at,
            environment: EnvironmentInfo::capture(generated_at),
        }
    }
}

/// Rounds `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// The normalized result of one module run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleReport {
    #[serde(flatten)]
    pub metrics: AggregateMetrics,
    pub scenarios: Vec<NormalizedScenarioResult>,
}

impl ModuleReport {
    pub fn new(scenarios: Vec<NormalizedScenarioResult>, generated_at: DateTime<Local>) -> Self {
        Self {
            metrics: AggregateMetrics::from_scenarios(&scenarios, generated_at),
            scenarios,
        }
    }

    /// A report for a module that contributed no scenarios.
    pub fn empty(generated_at: DateTime<Local>) -> Self {
        Self::new(Vec::new(), generated_at)
    }
}

/// Why a module run did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleFailure {
    /// The engine exited with a non-zero status (or was killed by a signal).
    ExitStatus { code: Option<i32> },
    /// The engine exceeded its wall-clock budget and was killed.
    Timeout { secs: u64 },
    /// The engine process could not be started.
    Spawn { message: String },
    /// Declared dependencies are not enabled or not scheduled earlier.
    UnsatisfiedDependencies { missing: Vec<String> },
    /// Dispatch stopped by a shutdown signal before this module started.
    Cancelled,
}

impl ModuleFailure {
    /// Gets a localized, one-line description of the failure.
    pub fn describe(&self, locale: &str) -> String {
        match self {
            ModuleFailure::ExitStatus { code: Some(code) } => {
                t!("failure.exit_code", locale = locale, code = code).to_string()
            }
            ModuleFailure::ExitStatus { code: None } => {
                t!("failure.killed", locale = locale).to_string()
            }
            ModuleFailure::Timeout { secs } => {
                t!("failure.timeout", locale = locale, secs = secs).to_string()
            }
            ModuleFailure::Spawn { message } => {
                t!("failure.spawn", locale = locale, message = message).to_string()
            }
            ModuleFailure::UnsatisfiedDependencies { missing } => t!(
                "failure.dependencies",
                locale = locale,
                missing = missing.join(", ")
            )
            .to_string(),
            ModuleFailure::Cancelled => t!("failure.cancelled", locale = locale).to_string(),
        }
    }
}

/// The outcome of running (or declining to run) one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRunOutcome {
    pub module_name: String,
    pub succeeded: bool,
    pub report: ModuleReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ModuleFailure>,
    /// Wall-clock time spent in the engine.
    pub elapsed: Duration,
}

impl ModuleRunOutcome {
    pub fn scenarios(&self) -> &[NormalizedScenarioResult] {
        &self.report.scenarios
    }

    /// `false` when the module was never handed to the engine.
    pub fn was_executed(&self) -> bool {
        !matches!(
            self.failure,
            Some(ModuleFailure::Cancelled) | Some(ModuleFailure::UnsatisfiedDependencies { .. })
        )
    }
}

/// Module-level outcome counts of a consolidated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub total_modules: usize,
    pub successful_modules: usize,
    pub failed_modules: usize,
    /// Percentage of successful modules; 0 when no module ran.
    pub success_rate: f64,
}

/// One row of the per-module table in consolidated reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleLine {
    pub module_name: String,
    pub succeeded: bool,
    pub scenario_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ModuleFailure>,
}

/// The merged view across every module of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedReport {
    #[serde(flatten)]
    pub metrics: AggregateMetrics,
    #[serde(flatten)]
    pub modules: ModuleSummary,
    pub module_results: Vec<ModuleLine>,
    pub scenarios: Vec<NormalizedScenarioResult>,
}
