// src/commands/report.rs

use anyhow::{Context, Result, bail};
use colored::*;
use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    commands::Workspace,
    core::{
        aggregator::{Aggregation, Aggregator},
        consolidator::consolidate,
        models::{ModuleRunOutcome, ScenarioStatus},
        registry::ModuleRegistry,
    },
    infra::{fs, t},
    reporting::{self, print_module_summary, print_run_summary},
};

/// Options of the `report` subcommand.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub config: PathBuf,
    pub project_dir: PathBuf,
    /// Restricts regeneration to these modules; empty means all declared.
    pub modules: Vec<String>,
    /// A single raw record to render instead of the configured modules.
    pub input: Option<PathBuf>,
    /// Output directory for `input`; defaults to the record's directory.
    pub output: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub lang: Option<String>,
}

/// Regenerates reports from raw records already on disk.
pub async fn execute(options: ReportOptions) -> Result<()> {
    match &options.input {
        Some(input) => render_single(input, &options),
        None => render_configured(&options).await,
    }
}

/// A module counts as successful after the fact when its record was usable
/// and none of its scenarios failed.
fn posthoc_outcome(module_name: &str, aggregation: Aggregation) -> ModuleRunOutcome {
    let degraded = aggregation.is_degraded();
    let report = aggregation.into_report();
    let succeeded = !degraded
        && report
            .scenarios
            .iter()
            .all(|scenario| scenario.status != ScenarioStatus::Failed);
    ModuleRunOutcome {
        module_name: module_name.to_string(),
        succeeded,
        report,
        failure: None,
        elapsed: Duration::ZERO,
    }
}

fn render_single(input: &Path, options: &ReportOptions) -> Result<()> {
    let locale = match options.lang.as_deref() {
        Some(lang) => crate::resolve_locale(lang),
        None => crate::system_locale(),
    };
    rust_i18n::set_locale(locale);

    if !input.is_file() {
        bail!("{}", t!("report.input_not_found", locale = locale, path = input.display()));
    }

    let module_name = options
        .modules
        .first()
        .cloned()
        .or_else(|| {
            input
                .file_stem()
                .map(|stem| stem.to_string_lossy().trim_end_matches("_raw").to_string())
        })
        .unwrap_or_else(|| "module".to_string());
    let output_dir = match &options.output {
        Some(dir) => dir.clone(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let aggregator = Aggregator::new(output_dir.join("evidence"));
    let aggregation = aggregator.aggregate_file(input);
    if let Aggregation::Degraded { error, .. } = &aggregation {
        println!(
            "{}",
            t!("run.record_unusable", locale = locale, name = &module_name, error = error).yellow()
        );
    }
    let outcome = posthoc_outcome(&module_name, aggregation);
    print_module_summary(&outcome, locale);

    let artifacts = reporting::write_report_pair(
        &output_dir,
        reporting::MODULE_REPORT_PREFIX,
        outcome.report.metrics.generation_timestamp,
        &reporting::html::render_module_report(&module_name, &outcome.report, locale),
        &reporting::analysis::render_analysis(&outcome.report)?,
    )?;
    println!(
        "{}",
        t!("run.module_report_written", locale = locale, path = artifacts.html.display()).cyan()
    );
    Ok(())
}

async fn render_configured(options: &ReportOptions) -> Result<()> {
    let workspace = Workspace::load(&options.config, &options.project_dir, options.lang.as_deref())?;
    let locale = workspace.locale;
    let registry = ModuleRegistry::from_config(&workspace.config)?;

    for name in &options.modules {
        if registry.get(name).is_none() {
            bail!("Unknown module '{}'.", name);
        }
    }

    let mut modules: Vec<_> = registry
        .all()
        .iter()
        .filter(|m| options.modules.is_empty() || options.modules.contains(&m.name))
        .collect();
    modules.sort_by_key(|m| m.execution_order);

    let report_dir = workspace.config.report_dir.clone();
    let mut pending = Vec::new();
    for module in modules {
        let raw = fs::raw_record_path(&report_dir, &module.name);
        if raw.is_file() {
            pending.push((module.name.clone(), raw));
        } else {
            println!(
                "{}",
                t!("report.no_raw_record", locale = locale, name = &module.name, path = raw.display())
                    .dimmed()
            );
        }
    }

    if pending.is_empty() {
        println!("{}", t!("report.nothing_to_render", locale = locale).yellow());
        return Ok(());
    }

    let jobs = options.jobs.unwrap_or_else(num_cpus::get).max(1);
    let aggregations: Vec<(String, Result<Aggregation>)> = stream::iter(pending)
        .map(|(name, raw)| {
            let evidence_dir = fs::evidence_dir(&report_dir, &name);
            async move {
                let result = tokio::task::spawn_blocking(move || {
                    Aggregator::new(evidence_dir).aggregate_file(&raw)
                })
                .await
                .context("Aggregation task panicked");
                (name, result)
            }
        })
        .buffered(jobs)
        .collect()
        .await;

    let mut outcomes = Vec::with_capacity(aggregations.len());
    for (name, aggregation) in aggregations {
        let aggregation = aggregation?;
        if let Aggregation::Degraded { error, .. } = &aggregation {
            println!(
                "{}",
                t!("run.record_unusable", locale = locale, name = &name, error = error).yellow()
            );
        }
        let outcome = posthoc_outcome(&name, aggregation);
        print_module_summary(&outcome, locale);
        match reporting::write_module_report(&report_dir, &name, &outcome.report, locale) {
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
        outcomes.push(outcome);
    }

    let consolidated = consolidate(&outcomes);
    let artifacts = reporting::write_consolidated_report(&report_dir, &consolidated, locale)?;
    println!(
        "\n{}",
        t!("run.consolidated_written", locale = locale, path = artifacts.html.display()).cyan()
    );
    print_run_summary(&consolidated, locale);
    Ok(())
}
