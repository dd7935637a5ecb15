//! # Result Aggregator
//!
//! Turns one module's raw run record into an ordered list of normalized
//! scenario results plus the module's [`AggregateMetrics`].
//!
//! Scenario verdicts and durations depend only on the scenario's raw
//! steps, so aggregating the same record twice yields the same counts,
//! statuses and durations. Only the generation timestamp and the
//! timestamps inside step evidence move with the wall clock.

use chrono::{DateTime, Local};
use std::path::Path;

use crate::core::evidence::{
    extract_parameters, step_logs, DeferredCapture, EvidenceCapture, StepData, StepEvidence,
};
use crate::core::models::{
    ModuleReport, NormalizedScenarioResult, ScenarioError, ScenarioStatus, StepDetail,
};
use crate::core::raw::{load_raw_record, RawRunRecord, RawScenarioRecord, RawStepRecord, RecordError, StepStatus};

/// Name of the synthetic scenario reported when a raw record is unusable.
pub const ERROR_SCENARIO_NAME: &str = "Error parsing report";

/// Error messages are cut to this many characters.
pub const MAX_ERROR_CHARS: usize = 500;

/// Appended to messages that were cut.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Fallback message for a failed step that reported no error text.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Folds an ordered sequence of step statuses into a scenario verdict while
/// summing every step's duration.
///
/// `Failed` is terminal: once reached, later steps still add their duration
/// but can no longer change the status. `Passed` drops to `Skipped` on the
/// first skipped, undefined or unrecognized step.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    status: ScenarioStatus,
    duration_seconds: f64,
    steps_seen: usize,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            status: ScenarioStatus::Passed,
            duration_seconds: 0.0,
            steps_seen: 0,
        }
    }

    pub fn observe(&mut self, step: StepStatus, duration_seconds: f64) {
        self.status = match (self.status, step) {
            (ScenarioStatus::Failed, _) => ScenarioStatus::Failed,
            (_, StepStatus::Failed) => ScenarioStatus::Failed,
            (ScenarioStatus::Passed, StepStatus::Passed) => ScenarioStatus::Passed,
            (ScenarioStatus::Passed, _) => ScenarioStatus::Skipped,
            (ScenarioStatus::Skipped, _) => ScenarioStatus::Skipped,
        };
        self.duration_seconds += duration_seconds;
        self.steps_seen += 1;
    }

    /// The verdict so far. A scenario without steps never ran and is skipped.
    pub fn status(&self) -> ScenarioStatus {
        if self.steps_seen == 0 {
            ScenarioStatus::Skipped
        } else {
            self.status
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

/// Result of aggregating a raw record that may not have been readable.
///
/// `Degraded` still carries a complete report (one failed sentinel
/// scenario) so callers can render it like any other; the original error
/// is kept alongside for logging.
#[derive(Debug)]
pub enum Aggregation {
    Parsed(ModuleReport),
    Degraded { report: ModuleReport, error: RecordError },
}

impl Aggregation {
    pub fn report(&self) -> &ModuleReport {
        match self {
            Aggregation::Parsed(report) | Aggregation::Degraded { report, .. } => report,
        }
    }

    pub fn into_report(self) -> ModuleReport {
        match self {
            Aggregation::Parsed(report) | Aggregation::Degraded { report, .. } => report,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Aggregation::Degraded { .. })
    }
}

/// Converts raw run records into [`ModuleReport`]s.
#[derive(Debug, Clone)]
pub struct Aggregator<C = DeferredCapture> {
    capture: C,
}

impl Aggregator<DeferredCapture> {
    /// An aggregator that plans screenshots under `evidence_dir`.
    pub fn new(evidence_dir: impl AsRef<Path>) -> Self {
        Self::with_capture(DeferredCapture::new(evidence_dir.as_ref()))
    }
}

impl<C: EvidenceCapture> Aggregator<C> {
    pub fn with_capture(capture: C) -> Self {
        Self { capture }
    }

    /// Reads the raw record at `path` and aggregates it.
    pub fn aggregate_file(&self, path: &Path) -> Aggregation {
        self.aggregate_record(load_raw_record(path))
    }

    /// Aggregates a raw record, turning an unusable one into sentinel data.
    pub fn aggregate_record(&self, record: Result<RawRunRecord, RecordError>) -> Aggregation {
        let now = Local::now();
        match record {
            Ok(record) => Aggregation::Parsed(self.aggregate_at(&record, now)),
            Err(error) => Aggregation::Degraded {
                report: error_report(&error, now),
                error,
            },
        }
    }

    pub fn aggregate(&self, record: &RawRunRecord) -> ModuleReport {
        self.aggregate_at(record, Local::now())
    }

    /// Aggregates `record` using `now` as the generation time.
    pub fn aggregate_at(&self, record: &RawRunRecord, now: DateTime<Local>) -> ModuleReport {
        let scenarios = record
            .features
            .iter()
            .flat_map(|feature| feature.scenarios())
            .map(|scenario| self.normalize_scenario(scenario, now))
            .collect();
        ModuleReport::new(scenarios, now)
    }

    fn normalize_scenario(
        &self,
        scenario: &RawScenarioRecord,
        now: DateTime<Local>,
    ) -> NormalizedScenarioResult {
        let mut tracker = StatusTracker::new();
        let mut steps = Vec::with_capacity(scenario.steps.len());

        for raw_step in &scenario.steps {
            let detail = self.normalize_step(raw_step, now);
            tracker.observe(detail.status, detail.duration_seconds);
            steps.push(detail);
        }

        let evidence_paths = steps
            .iter()
            .filter_map(|step| step.evidence.screenshot.as_ref())
            .map(|shot| shot.planned_path.display().to_string())
            .collect();

        NormalizedScenarioResult {
            name: scenario.name.clone(),
            description: scenario.description.clone().unwrap_or_default(),
            tags: scenario.tag_names(),
            status: tracker.status(),
            duration_seconds: tracker.duration_seconds(),
            error: first_failure(&scenario.steps),
            evidence_paths,
            start_time: steps.iter().find_map(|s| s.start_time.clone()),
            end_time: steps.iter().rev().find_map(|s| s.end_time.clone()),
            steps,
            module_name: None,
        }
    }

    fn normalize_step(&self, step: &RawStepRecord, now: DateTime<Local>) -> StepDetail {
        let status = step.status();
        let duration_seconds = step.duration_seconds();
        let result = step.result.as_ref();

        let screenshot = (status == StepStatus::Failed).then(|| self.capture.capture(&step.name, now));

        StepDetail {
            name: step.name.clone(),
            keyword: step.keyword.trim().to_string(),
            status,
            duration_seconds,
            error_message: result
                .and_then(|r| r.error_message.as_deref())
                .map(truncate_message),
            traceback: result.and_then(|r| r.traceback.clone()),
            start_time: result.and_then(|r| r.start_time.clone()),
            end_time: result.and_then(|r| r.end_time.clone()),
            evidence: StepEvidence {
                screenshot,
                logs: step_logs(&step.name, status, now),
                data: StepData {
                    execution_time: now,
                    step_duration_seconds: duration_seconds,
                    parameters: extract_parameters(&step.name),
                },
            },
        }
    }
}

/// The error of the first failed step, if any step failed.
fn first_failure(steps: &[RawStepRecord]) -> Option<ScenarioError> {
    let step = steps.iter().find(|step| step.status() == StepStatus::Failed)?;
    let result = step.result.as_ref();
    Some(ScenarioError {
        message: truncate_message(
            result
                .and_then(|r| r.error_message.as_deref())
                .unwrap_or(UNKNOWN_ERROR),
        ),
        traceback: result.and_then(|r| r.traceback.clone()),
        step_name: Some(step.name.clone()),
        step_keyword: Some(step.keyword.trim().to_string()),
    })
}

/// Cuts `message` to [`MAX_ERROR_CHARS`] characters and appends
/// [`TRUNCATION_MARKER`] when anything was dropped.
pub fn truncate_message(message: &str) -> String {
    match message.char_indices().nth(MAX_ERROR_CHARS) {
        Some((cut, _)) => format!("{}{}", &message[..cut], TRUNCATION_MARKER),
        None => message.to_string(),
    }
}

/// The report produced for an unreadable raw record: a single failed
/// scenario carrying the error text.
pub fn error_report(error: &RecordError, now: DateTime<Local>) -> ModuleReport {
    let scenario = NormalizedScenarioResult {
        name: ERROR_SCENARIO_NAME.to_string(),
        description: String::new(),
        tags: vec!["error".to_string()],
        status: ScenarioStatus::Failed,
        duration_seconds: 0.0,
        steps: Vec::new(),
        error: Some(ScenarioError {
            message: truncate_message(&error.to_string()),
            traceback: None,
            step_name: None,
            step_keyword: None,
        }),
        evidence_paths: Vec::new(),
        start_time: None,
        end_time: None,
        module_name: None,
    };
    ModuleReport::new(vec![scenario], now)
}
