//! # File System Operations Module
//!
//! Layout of the report directory and small helpers around it. Every
//! module owns `<report_dir>/<module>/`, which holds its raw record, its
//! timestamped reports and its planned evidence.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Timestamp format shared by every generated file name.
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension of the BDD feature files listed by the `list` command.
pub const FEATURE_EXTENSION: &str = "feature";

pub fn report_timestamp(at: DateTime<Local>) -> String {
    at.format(REPORT_TIMESTAMP_FORMAT).to_string()
}

/// Replaces everything but ASCII letters, digits, `-` and `_` so a module
/// name is always a single, safe path component.
pub fn sanitize_component(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "module".to_string()
    } else {
        sanitized
    }
}

/// `<report_dir>/<module>`
pub fn module_report_dir(report_dir: &Path, module_name: &str) -> PathBuf {
    report_dir.join(sanitize_component(module_name))
}

/// Where the engine writes the raw run record of `module_name`.
pub fn raw_record_path(report_dir: &Path, module_name: &str) -> PathBuf {
    module_report_dir(report_dir, module_name)
        .join(format!("{}_raw.json", sanitize_component(module_name)))
}

/// Where planned screenshots of `module_name` would be stored.
pub fn evidence_dir(report_dir: &Path, module_name: &str) -> PathBuf {
    module_report_dir(report_dir, module_name).join("evidence")
}

/// Creates `path` and its parents when missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Removes a file left over from an earlier run.
///
/// # Returns
/// `true` if a file was removed, `false` if there was nothing to remove.
pub fn remove_stale(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove stale file: {}", path.display()))
        }
    }
}

/// File names of the `.feature` files directly inside `dir`, sorted.
/// A missing directory yields an empty list.
pub fn list_feature_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == FEATURE_EXTENSION) {
            if let Some(name) = path.file_name() {
                names.push(name.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Gets the absolute path from a potentially relative path.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}
