//! # Execution Unit Tests
//!
//! Engine command construction and sequential orchestration driven by an
//! in-memory executor that writes raw records the way the engine would.

mod common;

use common::*;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use suite_runner::aggregator::ERROR_SCENARIO_NAME;
use suite_runner::config::{EngineConfig, ModuleDescriptor, SuiteConfig};
use suite_runner::core::execution::{
    EngineExit, ModuleExecutor, ModuleInvocation, Orchestrator, build_engine_command,
    overall_success,
};
use suite_runner::core::planner::{ModuleSelection, plan_execution};
use suite_runner::core::registry::ModuleRegistry;
use suite_runner::models::ModuleFailure;
use tempfile::{TempDir, tempdir};
use tokio_util::sync::CancellationToken;

/// What the fake engine does for one module.
#[derive(Clone)]
enum Behavior {
    /// Writes `record` and exits with `code`.
    Write { record: Value, code: i32 },
    /// Exits with `code` without writing anything.
    Exit { code: i32 },
    /// Never finishes on its own.
    Hang,
    /// Cannot be started.
    Unstartable,
}

struct FakeEngine {
    behaviors: Vec<(String, Behavior)>,
    calls: Mutex<Vec<String>>,
    /// Cancelled as soon as the named module runs.
    cancel_after: Option<(String, CancellationToken)>,
}

impl FakeEngine {
    fn new(behaviors: &[(&str, Behavior)]) -> Self {
        Self {
            behaviors: behaviors
                .iter()
                .map(|(name, behavior)| (name.to_string(), behavior.clone()))
                .collect(),
            calls: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ModuleExecutor for &FakeEngine {
    async fn execute(&self, invocation: &ModuleInvocation) -> EngineExit {
        self.calls.lock().unwrap().push(invocation.module_name.clone());
        if let Some((name, token)) = &self.cancel_after {
            if *name == invocation.module_name {
                token.cancel();
            }
        }

        let behavior = self
            .behaviors
            .iter()
            .find(|(name, _)| *name == invocation.module_name)
            .map(|(_, behavior)| behavior.clone())
            .unwrap_or(Behavior::Exit { code: 0 });

        match behavior {
            Behavior::Write { record, code } => {
                std::fs::write(&invocation.raw_record_path, record.to_string()).unwrap();
                completed(code)
            }
            Behavior::Exit { code } => completed(code),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                completed(0)
            }
            Behavior::Unstartable => EngineExit::SpawnFailed("engine: not found".to_string()),
        }
    }
}

fn completed(code: i32) -> EngineExit {
    EngineExit::Completed {
        success: code == 0,
        code: Some(code),
        output: String::new(),
    }
}

fn suite(report_dir: &Path, modules: Vec<ModuleDescriptor>) -> SuiteConfig {
    SuiteConfig {
        language: Some("en".to_string()),
        modules_dir: report_dir.join("modules"),
        report_dir: report_dir.join("reports"),
        timeout_secs: 1,
        engine: EngineConfig::default(),
        modules,
    }
}

fn module(name: &str, order: i64, deps: &[&str]) -> ModuleDescriptor {
    ModuleDescriptor {
        name: name.to_string(),
        execution_order: order,
        dependencies: deps.iter().map(|d| d.to_string()).collect(),
        ..ModuleDescriptor::default()
    }
}

fn passing_record() -> Value {
    json!([feature("F", vec![scenario("works", vec![passed("a", 0.5)])])])
}

fn failing_record() -> Value {
    json!([feature("F", vec![scenario("breaks", vec![failed("a", 0.5, "boom")])])])
}

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    (dir, root)
}

fn invocation(tags: Option<&str>, steps_dir: Option<&str>) -> ModuleInvocation {
    ModuleInvocation {
        module_name: "sales".to_string(),
        features_dir: PathBuf::from("/suite/modules/sales/features"),
        steps_dir: steps_dir.map(PathBuf::from),
        raw_record_path: PathBuf::from("/suite/reports/sales/sales_raw.json"),
        tags: tags.map(str::to_string),
        working_dir: PathBuf::from("/suite"),
    }
}

#[cfg(test)]
mod command_tests {
    use super::*;

    #[test]
    fn test_placeholders_are_replaced_per_argument() {
        let engine = EngineConfig {
            command: "behave {features} --outfile {outfile} -D module={module}".to_string(),
            steps_flag: None,
            ..EngineConfig::default()
        };
        let (program, args) = build_engine_command(&engine, &invocation(None, None)).unwrap();

        assert_eq!(program, "behave");
        assert_eq!(
            args,
            [
                "/suite/modules/sales/features",
                "--outfile",
                "/suite/reports/sales/sales_raw.json",
                "-D",
                "module=sales",
            ]
        );
    }

    #[test]
    fn test_quoted_template_arguments_stay_whole() {
        let engine = EngineConfig {
            command: "engine --title 'Nightly run' {features}".to_string(),
            steps_flag: None,
            ..EngineConfig::default()
        };
        let (_, args) = build_engine_command(&engine, &invocation(None, None)).unwrap();
        assert_eq!(args[1], "Nightly run");
    }

    #[test]
    fn test_tags_and_steps_are_appended() {
        let engine = EngineConfig {
            command: "behave {features}".to_string(),
            ..EngineConfig::default()
        };
        let (_, args) = build_engine_command(
            &engine,
            &invocation(Some("@smoke"), Some("/suite/modules/sales/steps")),
        )
        .unwrap();

        assert_eq!(
            args,
            [
                "/suite/modules/sales/features",
                "--tags",
                "@smoke",
                "--steps",
                "/suite/modules/sales/steps",
            ]
        );
    }

    #[test]
    fn test_blank_tags_are_not_forwarded() {
        let engine = EngineConfig {
            command: "behave".to_string(),
            steps_flag: None,
            ..EngineConfig::default()
        };
        let (_, args) = build_engine_command(&engine, &invocation(Some("  "), None)).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_steps_flag_disabled() {
        let engine = EngineConfig {
            command: "behave".to_string(),
            steps_flag: None,
            ..EngineConfig::default()
        };
        let (_, args) =
            build_engine_command(&engine, &invocation(None, Some("/suite/steps"))).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_unbalanced_quotes_are_rejected() {
        let engine = EngineConfig {
            command: "behave 'unterminated".to_string(),
            ..EngineConfig::default()
        };
        assert!(build_engine_command(&engine, &invocation(None, None)).is_err());
    }
}

#[cfg(test)]
mod orchestration_tests {
    use super::*;

    async fn run_all(config: &SuiteConfig, engine: &FakeEngine) -> Vec<suite_runner::models::ModuleRunOutcome> {
        let registry = ModuleRegistry::from_config(config).unwrap();
        let plan = plan_execution(&registry, &ModuleSelection::All).unwrap();
        Orchestrator::new(config, engine, config.report_dir.clone())
            .echo_output(false)
            .run(&plan)
            .await
    }

    #[tokio::test]
    async fn test_successful_module_is_aggregated() {
        let (_dir, root) = workspace();
        let config = suite(&root, vec![module("login", 1, &[])]);
        let engine = FakeEngine::new(&[(
            "login",
            Behavior::Write {
                record: passing_record(),
                code: 0,
            },
        )]);

        let outcomes = run_all(&config, &engine).await;

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].succeeded);
        assert!(outcomes[0].failure.is_none());
        assert_eq!(outcomes[0].report.metrics.passed, 1);
        assert!(root.join("reports/login/login_raw.json").is_file());
        assert!(overall_success(&outcomes));
    }

    #[tokio::test]
    async fn test_failed_module_does_not_stop_the_run() {
        let (_dir, root) = workspace();
        let config = suite(&root, vec![module("login", 1, &[]), module("stock", 2, &[])]);
        let engine = FakeEngine::new(&[
            (
                "login",
                Behavior::Write {
                    record: failing_record(),
                    code: 1,
                },
            ),
            (
                "stock",
                Behavior::Write {
                    record: passing_record(),
                    code: 0,
                },
            ),
        ]);

        let outcomes = run_all(&config, &engine).await;

        assert_eq!(engine.calls(), ["login", "stock"]);
        assert!(!outcomes[0].succeeded);
        assert_eq!(
            outcomes[0].failure,
            Some(ModuleFailure::ExitStatus { code: Some(1) })
        );
        assert_eq!(outcomes[0].report.metrics.failed, 1);
        assert!(outcomes[1].succeeded);
        assert!(!overall_success(&outcomes));
    }

    #[tokio::test]
    async fn test_missing_raw_record_becomes_sentinel() {
        let (_dir, root) = workspace();
        let config = suite(&root, vec![module("login", 1, &[])]);
        let engine = FakeEngine::new(&[("login", Behavior::Exit { code: 0 })]);

        let outcomes = run_all(&config, &engine).await;

        let report = &outcomes[0].report;
        assert_eq!(report.metrics.total, 1);
        assert_eq!(report.metrics.failed, 1);
        assert_eq!(report.scenarios[0].name, ERROR_SCENARIO_NAME);
    }

    #[tokio::test]
    async fn test_stale_raw_record_is_not_reused() {
        let (_dir, root) = workspace();
        let config = suite(&root, vec![module("login", 1, &[])]);
        let stale_dir = root.join("reports/login");
        std::fs::create_dir_all(&stale_dir).unwrap();
        write_json(&stale_dir, "login_raw.json", &passing_record());
        let engine = FakeEngine::new(&[("login", Behavior::Exit { code: 0 })]);

        let outcomes = run_all(&config, &engine).await;

        assert_eq!(outcomes[0].report.scenarios[0].name, ERROR_SCENARIO_NAME);
    }

    #[tokio::test]
    async fn test_timeout_fails_module_and_continues() {
        let (_dir, root) = workspace();
        let config = suite(&root, vec![module("slow", 1, &[]), module("fast", 2, &[])]);
        let engine = FakeEngine::new(&[
            ("slow", Behavior::Hang),
            (
                "fast",
                Behavior::Write {
                    record: passing_record(),
                    code: 0,
                },
            ),
        ]);

        let outcomes = run_all(&config, &engine).await;

        assert!(!outcomes[0].succeeded);
        assert_eq!(outcomes[0].failure, Some(ModuleFailure::Timeout { secs: 1 }));
        assert!(outcomes[1].succeeded);
        assert_eq!(engine.calls(), ["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let (_dir, root) = workspace();
        let config = suite(&root, vec![module("login", 1, &[])]);
        let engine = FakeEngine::new(&[("login", Behavior::Unstartable)]);

        let outcomes = run_all(&config, &engine).await;

        assert!(matches!(
            outcomes[0].failure,
            Some(ModuleFailure::Spawn { ref message }) if message.contains("not found")
        ));
    }

    #[tokio::test]
    async fn test_blocked_module_is_never_executed() {
        let (_dir, root) = workspace();
        let config = suite(
            &root,
            vec![module("sales", 1, &["ghost"]), module("stock", 2, &[])],
        );
        let engine = FakeEngine::new(&[]);

        let outcomes = run_all(&config, &engine).await;

        assert_eq!(engine.calls(), ["stock"]);
        assert_eq!(
            outcomes[0].failure,
            Some(ModuleFailure::UnsatisfiedDependencies {
                missing: vec!["ghost".to_string()]
            })
        );
        assert!(!outcomes[0].was_executed());
        assert!(outcomes[0].report.scenarios.is_empty());
        assert!(outcomes[1].was_executed());
    }

    #[tokio::test]
    async fn test_shutdown_stops_dispatch_of_later_modules() {
        let (_dir, root) = workspace();
        let config = suite(
            &root,
            vec![module("a", 1, &[]), module("b", 2, &[]), module("c", 3, &[])],
        );
        let token = CancellationToken::new();
        let mut engine = FakeEngine::new(&[]);
        engine.cancel_after = Some(("a".to_string(), token.clone()));

        let registry = ModuleRegistry::from_config(&config).unwrap();
        let plan = plan_execution(&registry, &ModuleSelection::All).unwrap();
        let outcomes = Orchestrator::new(&config, &engine, root.clone())
            .with_shutdown(token)
            .echo_output(false)
            .run(&plan)
            .await;

        assert_eq!(engine.calls(), ["a"]);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].failure != Some(ModuleFailure::Cancelled));
        assert_eq!(outcomes[1].failure, Some(ModuleFailure::Cancelled));
        assert_eq!(outcomes[2].failure, Some(ModuleFailure::Cancelled));
    }

    #[tokio::test]
    async fn test_steps_dir_forwarded_only_when_present() {
        let (_dir, root) = workspace();
        let config = suite(&root, vec![module("login", 1, &[])]);
        std::fs::create_dir_all(config.steps_dir("login")).unwrap();

        struct Capture(Mutex<Option<ModuleInvocation>>);
        impl ModuleExecutor for &Capture {
            async fn execute(&self, invocation: &ModuleInvocation) -> EngineExit {
                *self.0.lock().unwrap() = Some(invocation.clone());
                completed(0)
            }
        }

        let capture = Capture(Mutex::new(None));
        let registry = ModuleRegistry::from_config(&config).unwrap();
        let plan = plan_execution(&registry, &ModuleSelection::All).unwrap();
        Orchestrator::new(&config, &capture, root.clone())
            .with_tags(Some("@smoke".to_string()))
            .echo_output(false)
            .run(&plan)
            .await;

        let seen = capture.0.lock().unwrap().clone().unwrap();
        assert_eq!(seen.steps_dir, Some(config.steps_dir("login")));
        assert_eq!(seen.tags.as_deref(), Some("@smoke"));
        assert_eq!(seen.features_dir, config.features_dir("login"));
        assert_eq!(seen.working_dir, root);
    }

    #[test]
    fn test_empty_run_is_successful() {
        assert!(overall_success(&[]));
    }
}
