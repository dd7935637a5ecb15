//! Machine-readable twin of the HTML report.

use anyhow::{Context, Result};
use serde::Serialize;

/// Serializes `report` as pretty-printed JSON. The document is the same
/// value the HTML page was rendered from, field for field.
pub fn render_analysis<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize analysis report")
}
