//! # Step Evidence
//!
//! Evidence attached to each normalized step: a screenshot descriptor for
//! failed steps, a short log list and the parameters echoed from the step
//! text.
//!
//! Screenshots are a deferred capability. The GUI session belongs to the
//! engine process, so this crate only records where a capture *would* be
//! stored; [`EvidenceCapture`] is the seam for a real implementation.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::raw::StepStatus;

/// Double-quoted substrings of a Gherkin step, e.g. `"admin"` in
/// `I log in as "admin"`.
static QUOTED_PARAMETER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("quoted parameter pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// Capture was planned but not performed.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotDescriptor {
    pub planned_path: PathBuf,
    pub status: CaptureStatus,
    pub message: String,
}

/// Produces screenshot descriptors for failed steps.
pub trait EvidenceCapture {
    fn capture(&self, step_name: &str, at: DateTime<Local>) -> ScreenshotDescriptor;
}

/// The only capture strategy: plans a file under `evidence_dir` and
/// marks it deferred.
#[derive(Debug, Clone)]
pub struct DeferredCapture {
    evidence_dir: PathBuf,
}

impl DeferredCapture {
    pub fn new(evidence_dir: impl Into<PathBuf>) -> Self {
        Self {
            evidence_dir: evidence_dir.into(),
        }
    }

    pub fn evidence_dir(&self) -> &Path {
        &self.evidence_dir
    }
}

impl EvidenceCapture for DeferredCapture {
    fn capture(&self, step_name: &str, at: DateTime<Local>) -> ScreenshotDescriptor {
        let file_name = format!(
            "screenshot_{}_{}.png",
            sanitize_step_name(step_name),
            at.format("%Y%m%d_%H%M%S")
        );
        ScreenshotDescriptor {
            planned_path: self.evidence_dir.join(file_name),
            status: CaptureStatus::Deferred,
            message: "Screenshot capture is deferred to the GUI driver integration".to_string(),
        }
    }
}

/// Keeps alphanumerics, `-` and `_`, replaces everything else with `_`
/// and caps the result at 80 characters.
pub fn sanitize_step_name(step_name: &str) -> String {
    let sanitized: String = step_name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(80)
        .collect();
    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLogs {
    pub timestamp: String,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepData {
    pub execution_time: DateTime<Local>,
    pub step_duration_seconds: f64,
    /// Positional parameters quoted in the step text.
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<ScreenshotDescriptor>,
    pub logs: StepLogs,
    pub data: StepData,
}

/// The two log lines recorded for every step.
pub fn step_logs(step_name: &str, status: StepStatus, at: DateTime<Local>) -> StepLogs {
    let timestamp = at.format("%H:%M:%S").to_string();
    StepLogs {
        entries: vec![
            format!("{timestamp} - Executing step: {step_name}"),
            format!("{timestamp} - Step status: {status}"),
        ],
        timestamp,
    }
}

/// Extracts every double-quoted substring of `step_name`, in order.
pub fn extract_parameters(step_name: &str) -> Vec<String> {
    QUOTED_PARAMETER
        .captures_iter(step_name)
        .map(|caps| caps[1].to_string())
        .collect()
}
