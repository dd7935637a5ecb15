// Shared test helpers for integration tests
#![allow(dead_code)]

use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use suite_runner::core::raw::{RawRunRecord, parse_raw_record};
use suite_runner::models::{ModuleFailure, ModuleReport, ModuleRunOutcome};
use tempfile::{TempDir, tempdir};

pub const NS_PER_SEC: f64 = 1_000_000_000.0;

/// A raw step with the given status and duration in seconds.
pub fn step(name: &str, status: &str, seconds: f64) -> Value {
    json!({
        "keyword": "Given ",
        "name": name,
        "result": { "status": status, "duration": seconds * NS_PER_SEC }
    })
}

pub fn passed(name: &str, seconds: f64) -> Value {
    step(name, "passed", seconds)
}

pub fn skipped(name: &str) -> Value {
    step(name, "skipped", 0.0)
}

pub fn failed(name: &str, seconds: f64, message: &str) -> Value {
    json!({
        "keyword": "When ",
        "name": name,
        "result": {
            "status": "failed",
            "duration": seconds * NS_PER_SEC,
            "error_message": message
        }
    })
}

pub fn scenario(name: &str, steps: Vec<Value>) -> Value {
    json!({ "type": "scenario", "name": name, "tags": [], "steps": steps })
}

pub fn feature(name: &str, elements: Vec<Value>) -> Value {
    json!({ "name": name, "elements": elements })
}

pub fn record(features: Vec<Value>) -> RawRunRecord {
    parse_raw_record(&Value::Array(features).to_string()).expect("fixture is a valid raw record")
}

/// A record with a single feature holding a single scenario.
pub fn single_scenario(steps: Vec<Value>) -> RawRunRecord {
    record(vec![feature("Feature", vec![scenario("Scenario", steps)])])
}

pub fn write_json(dir: &Path, file_name: &str, value: &Value) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

pub fn outcome(module_name: &str, report: ModuleReport, succeeded: bool) -> ModuleRunOutcome {
    ModuleRunOutcome {
        module_name: module_name.to_string(),
        succeeded,
        report,
        failure: (!succeeded).then_some(ModuleFailure::ExitStatus { code: Some(1) }),
        elapsed: Duration::from_millis(10),
    }
}

/// A project directory with a configuration file and one `features/`
/// directory per module.
pub fn setup_project(config: &str, modules: &[&str]) -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    fs::write(temp_dir.path().join("SuiteRunner.toml"), config).expect("Failed to write config");
    for module in modules {
        let features = temp_dir.path().join("modules").join(module).join("features");
        fs::create_dir_all(&features).expect("Failed to create features directory");
        fs::write(
            features.join(format!("{module}.feature")),
            format!("Feature: {module}\n  Scenario: works\n    Given it works\n"),
        )
        .expect("Failed to write feature file");
    }
    temp_dir
}
