//! # Console Reporting Module
//!
//! Colorful, localized summaries printed while and after a run.

use colored::*;

use crate::core::models::{ConsolidatedReport, ModuleRunOutcome, ScenarioStatus};
use crate::infra::t;

/// Prints the scenario counts of one finished module.
///
/// # Output Format
/// ```text
///   login: 4 scenarios | 3 passed | 1 failed | 0 skipped | 12.31s
/// ```
pub fn print_module_summary(outcome: &ModuleRunOutcome, locale: &str) {
    let metrics = &outcome.report.metrics;
    println!(
        "  {}: {} | {} | {} | {} | {:.2}s",
        outcome.module_name.bold(),
        t!("summary.scenarios", locale = locale, count = metrics.total),
        t!("summary.passed", locale = locale, count = metrics.passed).green(),
        t!("summary.failed", locale = locale, count = metrics.failed).red(),
        t!("summary.skipped", locale = locale, count = metrics.skipped).yellow(),
        metrics.total_duration_seconds
    );
}

/// Prints the final summary of a run: one line per module, the module
/// totals and the overall verdict.
///
/// # Returns
/// `true` when every module succeeded.
pub fn print_run_summary(report: &ConsolidatedReport, locale: &str) -> bool {
    println!("\n{}", t!("summary.banner", locale = locale).cyan().bold());

    for line in &report.module_results {
        if line.succeeded {
            println!("  {} {}", "✓".green(), line.module_name.green());
        } else {
            let reason = line
                .failure
                .as_ref()
                .map(|f| format!(" ({})", f.describe(locale)))
                .unwrap_or_default();
            println!("  {} {}{}", "✗".red(), line.module_name.red(), reason);
        }
    }

    let modules = &report.modules;
    println!();
    println!(
        "{}",
        t!(
            "summary.modules_line",
            locale = locale,
            total = modules.total_modules,
            successful = modules.successful_modules,
            failed = modules.failed_modules
        )
    );
    println!(
        "{}",
        t!(
            "summary.success_rate",
            locale = locale,
            rate = format!("{:.1}", modules.success_rate)
        )
    );

    let metrics = &report.metrics;
    println!(
        "{}",
        t!(
            "summary.scenarios_line",
            locale = locale,
            total = metrics.total,
            passed = metrics.passed,
            failed = metrics.failed,
            skipped = metrics.skipped,
            duration = format!("{:.2}", metrics.total_duration_seconds)
        )
    );
    println!();

    if modules.all_succeeded() {
        println!("{}", t!("summary.overall_success", locale = locale).green().bold());
        true
    } else {
        println!("{}", t!("summary.overall_failure", locale = locale).red().bold());
        false
    }
}

/// Prints the failed scenarios of every module, with the failing step and
/// its error message.
pub fn print_failure_details(outcomes: &[ModuleRunOutcome], locale: &str) {
    let failed: Vec<_> = outcomes
        .iter()
        .flat_map(|outcome| {
            outcome
                .scenarios()
                .iter()
                .filter(|s| s.status == ScenarioStatus::Failed)
                .map(move |s| (outcome.module_name.as_str(), s))
        })
        .collect();

    if failed.is_empty() {
        return;
    }

    println!("\n{}", t!("summary.failures_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, (module_name, scenario)) in failed.iter().enumerate() {
        println!(
            "[{}/{}] {} / {}",
            i + 1,
            failed.len(),
            module_name.cyan(),
            scenario.name.bold()
        );
        if let Some(error) = &scenario.error {
            if let Some(step) = &error.step_name {
                println!(
                    "  {} {} {}",
                    t!("summary.failed_step", locale = locale).yellow(),
                    error.step_keyword.as_deref().unwrap_or_default(),
                    step
                );
            }
            for line in error.message.lines() {
                println!("    {}", line);
            }
        }
    }
    println!("{}", "-".repeat(80));
}
