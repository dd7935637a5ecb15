//! # CLI Integration Tests
//!
//! Runs the `suite-runner` binary end to end against throwaway projects.
//! The engine used by the `run` tests is a small `sh` script that copies a
//! prepared raw record to the requested output file.

mod common;

use assert_cmd::prelude::*;
use common::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn suite_runner() -> Command {
    let mut cmd = Command::cargo_bin("suite-runner").unwrap();
    cmd.env("NO_COLOR", "1").arg("--lang").arg("en");
    cmd
}

const TWO_MODULES: &str = r#"
[[modules]]
name = "login"
description = "Log in"
tags = ["@login"]
execution_order = 1

[[modules]]
name = "sales"
dependencies = ["login"]
execution_order = 2

[[modules]]
name = "legacy"
enabled = false
execution_order = 3
"#;

fn files_with_prefix(dir: &Path, prefix: &str, suffix: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(prefix) && name.ends_with(suffix))
        .collect()
}

#[cfg(test)]
mod general_tests {
    use super::*;

    #[test]
    fn test_help_lists_subcommands() {
        suite_runner()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("report"))
            .stdout(predicate::str::contains("list"))
            .stdout(predicate::str::contains("init"));
    }

    #[test]
    fn test_missing_config_fails() {
        let dir = tempdir().unwrap();
        suite_runner()
            .arg("run")
            .arg("--project-dir")
            .arg(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read configuration file"));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        suite_runner()
            .args(["run", "--timeout", "0"])
            .assert()
            .failure();
    }

    #[test]
    fn test_zero_jobs_is_rejected() {
        suite_runner()
            .args(["report", "--jobs", "0"])
            .assert()
            .failure();
    }
}

#[cfg(test)]
mod list_tests {
    use super::*;

    #[test]
    fn test_list_shows_modules_in_order() {
        let project = setup_project(TWO_MODULES, &["login", "sales"]);

        suite_runner()
            .arg("list")
            .arg("--project-dir")
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Configured modules (3):"))
            .stdout(predicate::str::contains("login.feature"))
            .stdout(predicate::str::contains("depends on: login"))
            .stdout(predicate::str::contains("disabled"))
            .stdout(predicate::str::contains("No .feature files"));
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;

    #[test]
    fn test_report_from_single_raw_record() {
        let dir = tempdir().unwrap();
        let raw = write_json(
            dir.path(),
            "sales_raw.json",
            &json!([feature(
                "Orders",
                vec![
                    scenario("ok", vec![passed("a", 1.0)]),
                    scenario("ko", vec![failed("b", 1.0, "boom")]),
                ]
            )]),
        );

        suite_runner()
            .arg("report")
            .arg("--input")
            .arg(&raw)
            .assert()
            .success()
            .stdout(predicate::str::contains("sales"))
            .stdout(predicate::str::contains("Report written to"));

        assert_eq!(files_with_prefix(dir.path(), "module_report_", ".html").len(), 1);
        assert_eq!(
            files_with_prefix(dir.path(), "module_report_", "_analysis.json").len(),
            1
        );
    }

    #[test]
    fn test_report_from_malformed_record_still_renders() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("broken_raw.json");
        fs::write(&raw, "{ this is not json").unwrap();
        let out = dir.path().join("out");

        suite_runner()
            .arg("report")
            .arg("--input")
            .arg(&raw)
            .arg("--output")
            .arg(&out)
            .assert()
            .success()
            .stdout(predicate::str::contains("could not be used"));

        let html = files_with_prefix(&out, "module_report_", ".html");
        assert_eq!(html.len(), 1);
        let content = fs::read_to_string(out.join(&html[0])).unwrap();
        assert!(content.contains("Error parsing report"));
    }

    #[test]
    fn test_report_missing_input_fails() {
        let dir = tempdir().unwrap();
        suite_runner()
            .arg("report")
            .arg("--input")
            .arg(dir.path().join("nope.json"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Raw run record not found"));
    }

    #[test]
    fn test_report_regenerates_configured_modules() {
        let project = setup_project(TWO_MODULES, &["login", "sales"]);
        let login_dir = project.path().join("reports/login");
        fs::create_dir_all(&login_dir).unwrap();
        write_json(
            &login_dir,
            "login_raw.json",
            &json!([feature("Login", vec![scenario("ok", vec![passed("a", 1.0)])])]),
        );

        suite_runner()
            .arg("report")
            .arg("--project-dir")
            .arg(project.path())
            .arg("--jobs")
            .arg("2")
            .assert()
            .success()
            .stdout(predicate::str::contains("No raw record for module 'sales'"))
            .stdout(predicate::str::contains("Consolidated report written to"));

        assert_eq!(files_with_prefix(&login_dir, "module_report_", ".html").len(), 1);
        assert_eq!(
            files_with_prefix(&project.path().join("reports"), "consolidated_report_", ".html").len(),
            1
        );
    }
}

#[cfg(test)]
mod init_tests {
    use super::*;

    #[test]
    fn test_non_interactive_init_and_force() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("SuiteRunner.toml");

        suite_runner()
            .arg("init")
            .arg("--non-interactive")
            .arg("--config")
            .arg(&config)
            .assert()
            .success();

        assert!(config.is_file());
        assert!(dir.path().join("modules/login/features").is_dir());
        assert!(dir.path().join("modules/sales/steps").is_dir());
        let content = fs::read_to_string(&config).unwrap();
        assert!(content.contains("name = \"login\""));

        suite_runner()
            .arg("init")
            .arg("--non-interactive")
            .arg("--config")
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));

        suite_runner()
            .arg("init")
            .arg("--non-interactive")
            .arg("--force")
            .arg("--config")
            .arg(&config)
            .assert()
            .success();
    }

    #[test]
    fn test_initialized_project_can_be_listed() {
        let dir = tempdir().unwrap();
        suite_runner()
            .arg("init")
            .arg("--non-interactive")
            .arg("--config")
            .arg(dir.path().join("SuiteRunner.toml"))
            .assert()
            .success();

        suite_runner()
            .arg("list")
            .arg("--project-dir")
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("login"))
            .stdout(predicate::str::contains("sales"));
    }
}

#[cfg(all(test, unix))]
mod run_tests {
    use super::*;

    fn project_with_engine(command: &str, modules: &[&str]) -> tempfile::TempDir {
        let mut config = format!("timeout_secs = 30\n\n[engine]\ncommand = \"{command}\"\n");
        for (order, name) in modules.iter().enumerate() {
            config.push_str(&format!(
                "\n[[modules]]\nname = \"{name}\"\nexecution_order = {}\n",
                order + 1
            ));
        }
        let project = setup_project(&config, modules);
        write_json(
            project.path(),
            "passing.json",
            &json!([feature("F", vec![scenario("works", vec![passed("a", 0.1)])])]),
        );
        write_json(
            project.path(),
            "failing.json",
            &json!([feature("F", vec![scenario("breaks", vec![failed("a", 0.1, "boom")])])]),
        );
        project
    }

    #[test]
    fn test_successful_run_writes_reports() {
        let project = project_with_engine("sh -c 'cp passing.json {outfile}'", &["login", "sales"]);

        suite_runner()
            .arg("run")
            .arg("--project-dir")
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Running module: login"))
            .stdout(predicate::str::contains("Running module: sales"))
            .stdout(predicate::str::contains("Success rate: 100.0%"))
            .stdout(predicate::str::contains("All modules passed."));

        let reports = project.path().join("reports");
        assert!(reports.join("login/login_raw.json").is_file());
        assert_eq!(files_with_prefix(&reports.join("sales"), "module_report_", ".html").len(), 1);
        assert_eq!(
            files_with_prefix(&reports, "consolidated_report_", "_analysis.json").len(),
            1
        );
    }

    #[test]
    fn test_failed_module_fails_the_run_but_keeps_going() {
        let project = project_with_engine(
            "sh -c 'if [ {module} = login ]; then cp failing.json {outfile}; exit 1; else cp passing.json {outfile}; fi'",
            &["login", "sales"],
        );

        suite_runner()
            .arg("run")
            .arg("--project-dir")
            .arg(project.path())
            .assert()
            .failure()
            .stdout(predicate::str::contains("engine exited with code 1"))
            .stdout(predicate::str::contains("Running module: sales"))
            .stdout(predicate::str::contains("Success rate: 50.0%"))
            .stdout(predicate::str::contains("boom"))
            .stderr(predicate::str::contains("One or more modules failed."));

        let reports = project.path().join("reports");
        assert_eq!(files_with_prefix(&reports, "consolidated_report_", ".html").len(), 1);
    }

    #[test]
    fn test_timeout_kills_module() {
        let project = project_with_engine("sh -c 'exec sleep 20'", &["slow"]);

        suite_runner()
            .arg("run")
            .arg("--project-dir")
            .arg(project.path())
            .arg("--timeout")
            .arg("1")
            .assert()
            .failure()
            .stdout(predicate::str::contains("timed out after 1s"))
            .stdout(predicate::str::contains("Error parsing report"));
    }

    #[test]
    fn test_explicit_module_selection() {
        let project = project_with_engine("sh -c 'cp passing.json {outfile}'", &["login", "sales"]);

        suite_runner()
            .arg("run")
            .arg("--project-dir")
            .arg(project.path())
            .arg("-m")
            .arg("sales")
            .assert()
            .success()
            .stdout(predicate::str::contains("Running module: sales"))
            .stdout(predicate::str::contains("Running module: login").not());
    }

    #[test]
    fn test_unknown_module_is_rejected() {
        let project = project_with_engine("sh -c 'cp passing.json {outfile}'", &["login"]);

        suite_runner()
            .arg("run")
            .arg("--project-dir")
            .arg(project.path())
            .arg("-m")
            .arg("ghost")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown module 'ghost'"));
    }

    #[test]
    fn test_missing_engine_is_reported() {
        let project = project_with_engine("definitely-not-an-engine-binary {features}", &["login"]);

        suite_runner()
            .arg("run")
            .arg("--project-dir")
            .arg(project.path())
            .assert()
            .failure()
            .stdout(predicate::str::contains("engine could not be started"));
    }
}
