//! # Raw Run Record
//!
//! Schema of the document emitted by the BDD engine for one module run:
//! an ordered list of features, each with an ordered list of elements,
//! each with an ordered list of steps. Only the fields the aggregator
//! needs are modelled; everything else in the engine's output is ignored.
//!
//! The engine is an external collaborator and its output varies between
//! formatter versions, so several fields accept more than one JSON shape
//! (tags as plain strings or `{ "name": ... }` objects, messages as a
//! string or a list of lines).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reasons a raw run record could not be turned into features.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The document is missing or unreadable.
    #[error("cannot read raw record {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON or does not have the expected shape.
    #[error("raw record is not a valid engine report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Status reported by the engine for a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    #[default]
    Skipped,
    Undefined,
    /// Any status this crate does not know about (`untested`, `hook_error`, ...).
    #[serde(other)]
    Other,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::Undefined => "undefined",
            StepStatus::Other => "unknown",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete raw run record: every feature the engine executed for one module.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RawRunRecord {
    pub features: Vec<RawFeatureRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFeatureRecord {
    #[serde(default)]
    pub name: String,
    /// `None` when the engine wrote a feature without an `elements` key;
    /// such features contribute nothing.
    #[serde(default)]
    pub elements: Option<Vec<RawScenarioRecord>>,
}

impl RawFeatureRecord {
    /// Iterates over the elements that are real scenarios (backgrounds and
    /// other element kinds are skipped).
    pub fn scenarios(&self) -> impl Iterator<Item = &RawScenarioRecord> {
        self.elements
            .iter()
            .flatten()
            .filter(|element| element.is_scenario())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawScenarioRecord {
    #[serde(rename = "type", default = "default_element_kind")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<RawTag>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<RawStepRecord>,
}

fn default_element_kind() -> String {
    "scenario".to_string()
}

impl RawScenarioRecord {
    pub fn is_scenario(&self) -> bool {
        self.kind == "scenario"
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.name().to_string()).collect()
    }
}

/// Tags come either as bare strings or as `{ "name": "...", "line": n }` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTag {
    Name(String),
    Object { name: String },
}

impl RawTag {
    pub fn name(&self) -> &str {
        match self {
            RawTag::Name(name) | RawTag::Object { name } => name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStepRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keyword: String,
    /// Steps that never ran have no `result` at all.
    #[serde(default)]
    pub result: Option<RawStepResult>,
}

impl RawStepRecord {
    pub fn status(&self) -> StepStatus {
        self.result
            .as_ref()
            .map(|result| result.status)
            .unwrap_or(StepStatus::Skipped)
    }

    /// Step duration in nanoseconds, clamped to be non-negative.
    pub fn duration_ns(&self) -> f64 {
        self.result
            .as_ref()
            .map(|result| result.duration.max(0.0))
            .unwrap_or(0.0)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_ns() / 1_000_000_000.0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStepResult {
    #[serde(default)]
    pub status: StepStatus,
    /// Nanoseconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub error_message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub traceback: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub end_time: Option<String>,
}

/// Accepts a string, a list of lines, a number or null and turns it into
/// optional text. Empty text is treated as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let text = match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(lines) => Some(
            lines
                .iter()
                .map(|line| match line {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Some(other.to_string()),
    };
    Ok(text.filter(|t| !t.trim().is_empty()))
}

/// Parses a raw run record from its JSON text.
pub fn parse_raw_record(content: &str) -> Result<RawRunRecord, RecordError> {
    Ok(serde_json::from_str(content)?)
}

/// Reads and parses the raw run record at `path`.
pub fn load_raw_record(path: &Path) -> Result<RawRunRecord, RecordError> {
    let content = fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_raw_record(&content)
}
