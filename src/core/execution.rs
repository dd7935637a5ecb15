//! # Module Execution Module
//!
//! Runs the external BDD engine once per module, strictly one module at a
//! time, and folds each run into a [`ModuleRunOutcome`].
//!
//! A module that exceeds its wall-clock budget is killed and reported as
//! failed; orchestration then moves on to the next module. A shutdown
//! signal only stops the dispatch of modules that have not started yet.

use anyhow::{Context, Result, anyhow};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::aggregator::{Aggregation, Aggregator};
use crate::core::config::{EngineConfig, SuiteConfig};
use crate::core::models::{ModuleFailure, ModuleReport, ModuleRunOutcome};
use crate::core::planner::{ExecutionPlan, PlannedModule};
use crate::infra::{command, fs, t};

/// Environment variable carrying the module name into the engine process.
pub const MODULE_ENV_VAR: &str = "SUITE_RUNNER_MODULE";

/// Everything an executor needs to run one module.
#[derive(Debug, Clone)]
pub struct ModuleInvocation {
    pub module_name: String,
    pub features_dir: PathBuf,
    /// The module's step definitions, forwarded only when the directory exists.
    pub steps_dir: Option<PathBuf>,
    /// Where the engine must write its raw run record.
    pub raw_record_path: PathBuf,
    /// Tag expression forwarded to the engine.
    pub tags: Option<String>,
    pub working_dir: PathBuf,
}

/// How an engine process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineExit {
    Completed {
        success: bool,
        code: Option<i32>,
        output: String,
    },
    SpawnFailed(String),
}

/// Runs the BDD engine for one module.
///
/// Implementations must stop their work when the returned future is
/// dropped; that is how timeouts are enforced.
#[allow(async_fn_in_trait)]
pub trait ModuleExecutor {
    async fn execute(&self, invocation: &ModuleInvocation) -> EngineExit;
}

/// Builds the program and arguments for `invocation` from the engine
/// command template.
///
/// The template is expanded (`~`, environment variables) and split like a
/// shell would before `{features}`, `{outfile}` and `{module}` are replaced
/// in each argument, so paths with spaces stay one argument.
pub fn build_engine_command(
    engine: &EngineConfig,
    invocation: &ModuleInvocation,
) -> Result<(String, Vec<String>)> {
    let expanded = shellexpand::full(&engine.command)
        .with_context(|| format!("Failed to expand command: {}", engine.command))?
        .to_string();
    let parts = shlex::split(&expanded)
        .ok_or_else(|| anyhow!("Failed to parse command: {}", expanded))?;

    let features = invocation.features_dir.display().to_string();
    let outfile = invocation.raw_record_path.display().to_string();
    let mut parts = parts.into_iter().map(|part| {
        part.replace("{features}", &features)
            .replace("{outfile}", &outfile)
            .replace("{module}", &invocation.module_name)
    });

    let program = parts
        .next()
        .ok_or_else(|| anyhow!("Empty command after parsing."))?;
    let mut args: Vec<String> = parts.collect();

    if let Some(tags) = invocation.tags.as_deref().filter(|t| !t.trim().is_empty()) {
        args.push(engine.tags_flag.clone());
        args.push(tags.to_string());
    }
    if let (Some(flag), Some(steps_dir)) = (&engine.steps_flag, &invocation.steps_dir) {
        args.push(flag.clone());
        args.push(steps_dir.display().to_string());
    }

    Ok((program, args))
}

/// The production executor: spawns the configured engine command.
#[derive(Debug, Clone)]
pub struct EngineRunner {
    engine: EngineConfig,
}

impl EngineRunner {
    pub fn new(engine: EngineConfig) -> Self {
        Self { engine }
    }
}

impl ModuleExecutor for EngineRunner {
    async fn execute(&self, invocation: &ModuleInvocation) -> EngineExit {
        let (program, args) = match build_engine_command(&self.engine, invocation) {
            Ok(command) => command,
            Err(e) => return EngineExit::SpawnFailed(format!("{e:#}")),
        };

        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(&args)
            .envs(&self.engine.env)
            .env(MODULE_ENV_VAR, &invocation.module_name)
            .kill_on_drop(true)
            .current_dir(&invocation.working_dir);

        let (status_res, output) = command::spawn_and_capture(cmd).await;
        let command_log = format!(
            "{} {} {}\n",
            t!("run.command_prefix").blue(),
            program,
            shlex::try_join(args.iter().map(String::as_str)).unwrap_or_else(|_| args.join(" "))
        );

        match status_res {
            Ok(status) => EngineExit::Completed {
                success: status.success(),
                code: status.code(),
                output: format!("{command_log}{output}"),
            },
            Err(e) => EngineExit::SpawnFailed(format!("{program}: {e}")),
        }
    }
}

/// Runs an [`ExecutionPlan`] module by module.
pub struct Orchestrator<'a, E> {
    config: &'a SuiteConfig,
    executor: E,
    working_dir: PathBuf,
    tags: Option<String>,
    locale: String,
    shutdown: CancellationToken,
    echo_output: bool,
}

impl<'a, E: ModuleExecutor> Orchestrator<'a, E> {
    pub fn new(config: &'a SuiteConfig, executor: E, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            executor,
            working_dir: working_dir.into(),
            tags: None,
            locale: crate::resolve_locale(config.language.as_deref().unwrap_or("en")).to_string(),
            shutdown: CancellationToken::new(),
            echo_output: true,
        }
    }

    pub fn with_tags(mut self, tags: Option<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Once `token` is cancelled, modules that have not started are
    /// recorded as cancelled instead of being run.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Whether the engine's captured output is echoed after each module.
    pub fn echo_output(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }

    /// Runs every module of `plan` in order and returns one outcome per
    /// planned module, in plan order.
    pub async fn run(&self, plan: &ExecutionPlan) -> Vec<ModuleRunOutcome> {
        let total = plan.modules.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, planned) in plan.modules.iter().enumerate() {
            let outcome = if self.shutdown.is_cancelled() {
                println!(
                    "{}",
                    t!("run.module_cancelled", locale = &self.locale, name = &planned.descriptor.name)
                        .yellow()
                );
                not_run(planned, ModuleFailure::Cancelled)
            } else {
                println!(
                    "\n{}",
                    t!(
                        "run.module_start",
                        locale = &self.locale,
                        index = index + 1,
                        total = total,
                        name = planned.descriptor.title()
                    )
                    .cyan()
                    .bold()
                );
                self.run_module(planned).await
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Runs a single planned module.
    pub async fn run_module(&self, planned: &PlannedModule) -> ModuleRunOutcome {
        let descriptor = &planned.descriptor;
        let locale = self.locale.as_str();

        if !planned.is_runnable() {
            let missing: Vec<String> = planned.missing_dependencies.iter().cloned().collect();
            println!(
                "{}",
                t!(
                    "run.dependencies_missing",
                    locale = locale,
                    name = &descriptor.name,
                    missing = missing.join(", ")
                )
                .red()
            );
            return not_run(planned, ModuleFailure::UnsatisfiedDependencies { missing });
        }

        let report_dir = fs::module_report_dir(&self.config.report_dir, &descriptor.name);
        if let Err(e) = fs::ensure_dir(&report_dir) {
            println!("{}", format!("{e:#}").red());
            return not_run(
                planned,
                ModuleFailure::Spawn {
                    message: format!("{e:#}"),
                },
            );
        }

        let invocation = self.invocation_for(&descriptor.name);
        match fs::remove_stale(&invocation.raw_record_path) {
            Ok(true) => println!(
                "{}",
                t!(
                    "run.stale_record_removed",
                    locale = locale,
                    path = invocation.raw_record_path.display()
                )
                .dimmed()
            ),
            Ok(false) => {}
            Err(e) => println!("{}", format!("{e:#}").yellow()),
        }

        let timeout = self.config.module_timeout(descriptor);
        let start = Instant::now();
        let exit = tokio::time::timeout(timeout, self.executor.execute(&invocation)).await;
        let elapsed = start.elapsed();

        let (succeeded, failure) = match exit {
            Ok(EngineExit::Completed {
                success,
                code,
                output,
            }) => {
                if self.echo_output && !output.trim().is_empty() {
                    println!("{}", output.trim());
                }
                if success {
                    (true, None)
                } else {
                    (false, Some(ModuleFailure::ExitStatus { code }))
                }
            }
            Ok(EngineExit::SpawnFailed(message)) => (false, Some(ModuleFailure::Spawn { message })),
            Err(_) => (
                false,
                Some(ModuleFailure::Timeout {
                    secs: timeout.as_secs(),
                }),
            ),
        };

        let report = self.collect_report(&descriptor.name, &invocation.raw_record_path);
        let outcome = ModuleRunOutcome {
            module_name: descriptor.name.clone(),
            succeeded,
            report,
            failure,
            elapsed,
        };
        self.announce(&outcome);
        outcome
    }

    fn invocation_for(&self, module_name: &str) -> ModuleInvocation {
        let steps_dir = self.config.steps_dir(module_name);
        ModuleInvocation {
            module_name: module_name.to_string(),
            features_dir: self.config.features_dir(module_name),
            steps_dir: steps_dir.is_dir().then_some(steps_dir),
            raw_record_path: fs::raw_record_path(&self.config.report_dir, module_name),
            tags: self.tags.clone(),
            working_dir: self.working_dir.clone(),
        }
    }

    fn collect_report(&self, module_name: &str, raw_record_path: &Path) -> ModuleReport {
        let aggregator = Aggregator::new(fs::evidence_dir(&self.config.report_dir, module_name));
        let aggregation = aggregator.aggregate_file(raw_record_path);
        if let Aggregation::Degraded { error, .. } = &aggregation {
            println!(
                "{}",
                t!(
                    "run.record_unusable",
                    locale = &self.locale,
                    name = module_name,
                    error = error
                )
                .yellow()
            );
        }
        aggregation.into_report()
    }

    fn announce(&self, outcome: &ModuleRunOutcome) {
        let duration = format!("{:.2}", outcome.elapsed.as_secs_f64());
        if outcome.succeeded {
            println!(
                "{}",
                t!(
                    "run.module_passed",
                    locale = &self.locale,
                    name = &outcome.module_name,
                    duration = duration
                )
                .green()
            );
        } else {
            let reason = outcome
                .failure
                .as_ref()
                .map(|f| f.describe(&self.locale))
                .unwrap_or_default();
            println!(
                "{}",
                t!(
                    "run.module_failed",
                    locale = &self.locale,
                    name = &outcome.module_name,
                    duration = duration,
                    reason = reason
                )
                .red()
            );
        }
    }
}

fn not_run(planned: &PlannedModule, failure: ModuleFailure) -> ModuleRunOutcome {
    ModuleRunOutcome {
        module_name: planned.descriptor.name.clone(),
        succeeded: false,
        report: ModuleReport::empty(chrono::Local::now()),
        failure: Some(failure),
        elapsed: Duration::ZERO,
    }
}

/// `true` when every outcome succeeded. An empty run is not a failure.
pub fn overall_success(outcomes: &[ModuleRunOutcome]) -> bool {
    outcomes.iter().all(|outcome| outcome.succeeded)
}
