//! # Reporting Module
//!
//! This module writes module and consolidated reports to disk and prints
//! run summaries to the console. Each report is written twice from the same
//! in-memory value: as an HTML page and as an analysis JSON document that
//! share one timestamped file stem.

pub mod analysis;
pub mod console;
pub mod html;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::models::{ConsolidatedReport, ModuleReport};
use crate::infra::fs::{ensure_dir, module_report_dir, report_timestamp};

pub use console::{print_failure_details, print_module_summary, print_run_summary};

/// File stem of per-module reports.
pub const MODULE_REPORT_PREFIX: &str = "module_report";

/// File stem of cross-module reports.
pub const CONSOLIDATED_REPORT_PREFIX: &str = "consolidated_report";

/// Paths of one written report pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifacts {
    pub html: PathBuf,
    pub analysis: PathBuf,
}

/// `<prefix>_<YYYYmmdd_HHMMSS>`
pub fn report_file_stem(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}_{}", prefix, report_timestamp(at))
}

/// Writes `<dir>/<stem>.html` and `<dir>/<stem>_analysis.json`.
pub fn write_report_pair(
    dir: &Path,
    prefix: &str,
    at: DateTime<Local>,
    html: &str,
    analysis: &str,
) -> Result<ReportArtifacts> {
    ensure_dir(dir)?;
    let stem = report_file_stem(prefix, at);
    let artifacts = ReportArtifacts {
        html: dir.join(format!("{stem}.html")),
        analysis: dir.join(format!("{stem}_analysis.json")),
    };

    fs::write(&artifacts.html, html)
        .with_context(|| format!("Failed to write report: {}", artifacts.html.display()))?;
    fs::write(&artifacts.analysis, analysis)
        .with_context(|| format!("Failed to write report: {}", artifacts.analysis.display()))?;
    Ok(artifacts)
}

/// Renders and writes the reports of one module under
/// `<report_dir>/<module>/`.
pub fn write_module_report(
    report_dir: &Path,
    module_name: &str,
    report: &ModuleReport,
    locale: &str,
) -> Result<ReportArtifacts> {
    let html = html::render_module_report(module_name, report, locale);
    let analysis = analysis::render_analysis(report)?;
    write_report_pair(
        &module_report_dir(report_dir, module_name),
        MODULE_REPORT_PREFIX,
        report.metrics.generation_timestamp,
        &html,
        &analysis,
    )
}

/// Renders and writes the consolidated reports directly under `report_dir`.
pub fn write_consolidated_report(
    report_dir: &Path,
    report: &ConsolidatedReport,
    locale: &str,
) -> Result<ReportArtifacts> {
    let html = html::render_consolidated_report(report, locale);
    let analysis = analysis::render_analysis(report)?;
    write_report_pair(
        report_dir,
        CONSOLIDATED_REPORT_PREFIX,
        report.metrics.generation_timestamp,
        &html,
        &analysis,
    )
}
