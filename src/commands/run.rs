// src/commands/run.rs

use anyhow::Result;
use colored::*;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    commands::Workspace,
    core::{
        consolidator::consolidate,
        execution::{EngineRunner, Orchestrator},
        models::ModuleRunOutcome,
        planner::{self, ExecutionPlan, ModuleSelection},
        registry::ModuleRegistry,
    },
    infra::t,
    reporting::{self, print_failure_details, print_module_summary, print_run_summary},
};

/// Options of the `run` subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: PathBuf,
    pub project_dir: PathBuf,
    /// Explicit module selection; empty means every enabled module.
    pub modules: Vec<String>,
    pub tags: Option<String>,
    pub report_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub quiet: bool,
    pub lang: Option<String>,
}

pub async fn execute(options: RunOptions) -> Result<()> {
    let mut workspace = Workspace::load(&options.config, &options.project_dir, options.lang.as_deref())?;
    let locale = workspace.locale;

    if let Some(report_dir) = &options.report_dir {
        workspace.config.report_dir = workspace.project_root.join(report_dir);
    }
    if let Some(timeout) = options.timeout_secs {
        workspace.config.timeout_secs = timeout;
    }

    println!(
        "{}",
        t!("run.project_root", locale = locale, path = workspace.project_root.display())
    );
    println!(
        "{}",
        t!("run.loading_config", locale = locale, path = workspace.config_path.display())
    );

    let registry = ModuleRegistry::from_config(&workspace.config)?;
    let selection = if options.modules.is_empty() {
        ModuleSelection::All
    } else {
        ModuleSelection::Only(options.modules.clone())
    };
    let plan = planner::plan_execution(&registry, &selection)?;
    announce_plan(&plan, locale);

    if plan.is_empty() {
        println!("{}", t!("run.no_modules", locale = locale).green());
        return Ok(());
    }

    let stop_token = setup_signal_handler(locale);
    let orchestrator = Orchestrator::new(
        &workspace.config,
        EngineRunner::new(workspace.config.engine.clone()),
        &workspace.project_root,
    )
    .with_tags(options.tags.clone())
    .with_locale(locale)
    .with_shutdown(stop_token)
    .echo_output(!options.quiet);

    let outcomes = orchestrator.run(&plan).await;
    write_module_reports(&workspace, &outcomes);

    let consolidated = consolidate(&outcomes);
    match reporting::write_consolidated_report(&workspace.config.report_dir, &consolidated, locale) {
        Ok(artifacts) => println!(
            "\n{}",
            t!("run.consolidated_written", locale = locale, path = artifacts.html.display()).cyan()
        ),
        Err(e) => eprintln!(
            "{} {:#}",
            t!("run.report_write_failed", locale = locale).red(),
            e
        ),
    }

    print_failure_details(&outcomes, locale);
    if print_run_summary(&consolidated, locale) {
        Ok(())
    } else {
        anyhow::bail!("{}", t!("run.failed", locale = locale))
    }
}

fn announce_plan(plan: &ExecutionPlan, locale: &str) {
    if plan.disabled_count > 0 {
        println!(
            "{}",
            t!("run.disabled_modules", locale = locale, count = plan.disabled_count).cyan()
        );
    }
    for name in &plan.forced_disabled {
        println!(
            "{}",
            t!("run.running_disabled_module", locale = locale, name = name).yellow()
        );
    }
    println!(
        "{}",
        t!(
            "run.plan_summary",
            locale = locale,
            runnable = plan.runnable_count(),
            total = plan.modules.len()
        )
        .bold()
    );
}

fn write_module_reports(workspace: &Workspace, outcomes: &[ModuleRunOutcome]) {
    let locale = workspace.locale;
    println!("\n{}", t!("run.module_reports_banner", locale = locale).cyan());

    for outcome in outcomes {
        print_module_summary(outcome, locale);
        if !outcome.was_executed() {
            continue;
        }
        match reporting::write_module_report(
            &workspace.config.report_dir,
            &outcome.module_name,
            &outcome.report,
            locale,
        ) {
            Ok(artifacts) => println!(
                "    {}",
                t!("run.module_report_written", locale = locale, path = artifacts.html.display())
                    .dimmed()
            ),
            Err(e) => eprintln!(
                "    {} {:#}",
                t!("run.report_write_failed", locale = locale).red(),
                e
            ),
        }
    }
}

/// Cancels the returned token on Ctrl-C. Modules already running finish or
/// time out; the rest are not started.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("run.shutdown_signal", locale = &locale).yellow());
            token_clone.cancel();
        }
    });

    token
}
