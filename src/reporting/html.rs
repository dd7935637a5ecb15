//! # HTML Reporting Module
//!
//! Renders module and consolidated reports as self-contained HTML pages.
//! Rendering is a pure function of the report value: counts, statuses and
//! ordering are shown exactly as aggregated.

use chrono::{DateTime, Local};
use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::core::models::{
    AggregateMetrics, ConsolidatedReport, EnvironmentInfo, ModuleLine, ModuleReport,
    ModuleSummary, NormalizedScenarioResult, StepDetail,
};
use crate::infra::t;

/// Embedded CSS styles for HTML reports
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Embedded JavaScript for HTML report interactivity
const HTML_SCRIPT: &str = include_str!("assets/report.js");

/// Renders the report of a single module.
pub fn render_module_report(module_name: &str, report: &ModuleReport, locale: &str) -> String {
    let title = t!("html.module_title", locale = locale, name = module_name).to_string();
    let body = html! {
        (summary_cards(&report.metrics, locale))
        h2 { (t!("html.section.scenarios", locale = locale)) }
        (scenario_list(&report.scenarios, locale))
        (environment_table(&report.metrics.environment, locale))
    };
    page(&title, &report.metrics.generation_timestamp, body, locale).into_string()
}

/// Renders the cross-module report, including the per-module results table.
pub fn render_consolidated_report(report: &ConsolidatedReport, locale: &str) -> String {
    let title = t!("html.consolidated_title", locale = locale).to_string();
    let body = html! {
        (module_summary_cards(&report.modules, locale))
        (summary_cards(&report.metrics, locale))
        h2 { (t!("html.section.modules", locale = locale)) }
        (module_table(&report.module_results, locale))
        h2 { (t!("html.section.scenarios", locale = locale)) }
        (scenario_list(&report.scenarios, locale))
        (environment_table(&report.metrics.environment, locale))
    };
    page(&title, &report.metrics.generation_timestamp, body, locale).into_string()
}

fn page(title: &str, generated_at: &DateTime<Local>, body: Markup, locale: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(locale) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (title) }
                p.subtitle {
                    (t!(
                        "html.generated_at",
                        locale = locale,
                        timestamp = generated_at.format("%Y-%m-%d %H:%M:%S")
                    ))
                }
                (body)
                script { (PreEscaped(HTML_SCRIPT)) }
            }
        }
    }
}

fn summary_item(count: impl maud::Render, label: &str, class: &str) -> Markup {
    html! {
        div.summary-item {
            span class={ "count " (class) } { (count) }
            span.label { (label) }
        }
    }
}

fn summary_cards(metrics: &AggregateMetrics, locale: &str) -> Markup {
    html! {
        div.summary-container {
            (summary_item(metrics.total, &t!("html.summary.total", locale = locale), ""))
            (summary_item(metrics.passed, &t!("html.summary.passed", locale = locale), "passed-text"))
            (summary_item(metrics.failed, &t!("html.summary.failed", locale = locale), "failed-text"))
            (summary_item(metrics.skipped, &t!("html.summary.skipped", locale = locale), "skipped-text"))
            (summary_item(
                format!("{:.2}s", metrics.total_duration_seconds),
                &t!("html.summary.duration", locale = locale),
                ""
            ))
            (summary_item(
                format!("{:.2}s", metrics.average_duration_seconds),
                &t!("html.summary.average", locale = locale),
                ""
            ))
        }
    }
}

fn module_summary_cards(modules: &ModuleSummary, locale: &str) -> Markup {
    html! {
        div.summary-container {
            (summary_item(modules.total_modules, &t!("html.summary.modules", locale = locale), ""))
            (summary_item(
                modules.successful_modules,
                &t!("html.summary.successful_modules", locale = locale),
                "passed-text"
            ))
            (summary_item(
                modules.failed_modules,
                &t!("html.summary.failed_modules", locale = locale),
                "failed-text"
            ))
            (summary_item(
                format!("{:.1}%", modules.success_rate),
                &t!("html.summary.success_rate", locale = locale),
                ""
            ))
        }
    }
}

fn module_table(lines: &[ModuleLine], locale: &str) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { (t!("html.table.module", locale = locale)) }
                    th { (t!("html.table.result", locale = locale)) }
                    th.duration-cell { (t!("html.table.scenarios", locale = locale)) }
                    th { (t!("html.table.details", locale = locale)) }
                }
            }
            tbody {
                @for line in lines {
                    tr {
                        td { (line.module_name) }
                        td {
                            @if line.succeeded {
                                div.status-cell.status-passed { (t!("html.module_passed", locale = locale)) }
                            } @else {
                                div.status-cell.status-failed { (t!("html.module_failed", locale = locale)) }
                            }
                        }
                        td.duration-cell { (line.scenario_count) }
                        td {
                            @if let Some(failure) = &line.failure {
                                (failure.describe(locale))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn scenario_list(scenarios: &[NormalizedScenarioResult], locale: &str) -> Markup {
    html! {
        @if scenarios.is_empty() {
            p.subtitle { (t!("html.no_scenarios", locale = locale)) }
        } @else {
            div.filters {
                button.active onclick="filterScenarios('all', this)" { (t!("html.filter.all", locale = locale)) }
                button onclick="filterScenarios('passed', this)" { (t!("html.filter.passed", locale = locale)) }
                button onclick="filterScenarios('failed', this)" { (t!("html.filter.failed", locale = locale)) }
                button onclick="filterScenarios('skipped', this)" { (t!("html.filter.skipped", locale = locale)) }
                button onclick="toggleAll(true)" { (t!("html.expand_all", locale = locale)) }
                button onclick="toggleAll(false)" { (t!("html.collapse_all", locale = locale)) }
            }
            @for scenario in scenarios {
                (scenario_block(scenario, locale))
            }
        }
    }
}

fn scenario_block(scenario: &NormalizedScenarioResult, locale: &str) -> Markup {
    html! {
        details.scenario data-status=(scenario.status.as_str()) {
            summary {
                span class={ "status-cell " (scenario.status.css_class()) } { (scenario.status.label(locale)) }
                span.scenario-name { (scenario.name) }
                @if let Some(module) = &scenario.module_name {
                    span.module-badge { (module) }
                }
                span.duration-cell { (format!("{:.2}s", scenario.duration_seconds)) }
            }
            div.scenario-body {
                @if !scenario.tags.is_empty() {
                    p {
                        @for tag in &scenario.tags {
                            span.tag { "@" (tag) }
                        }
                    }
                }
                @if !scenario.description.is_empty() {
                    p { (scenario.description) }
                }
                @if let Some(error) = &scenario.error {
                    div.error-box {
                        strong { (t!("html.error_title", locale = locale)) }
                        @if let Some(step) = &error.step_name {
                            p {
                                (t!(
                                    "html.error_step",
                                    locale = locale,
                                    keyword = error.step_keyword.as_deref().unwrap_or(""),
                                    name = step
                                ))
                            }
                        }
                        pre { (error.message) }
                        @if let Some(traceback) = &error.traceback {
                            pre { (traceback) }
                        }
                    }
                }
                @if let (Some(start), Some(end)) = (&scenario.start_time, &scenario.end_time) {
                    p.evidence { (t!("html.time_window", locale = locale, start = start, end = end)) }
                }
                table {
                    thead {
                        tr {
                            th { (t!("html.table.step", locale = locale)) }
                            th { (t!("html.table.status", locale = locale)) }
                            th.duration-cell { (t!("html.table.duration", locale = locale)) }
                        }
                    }
                    tbody {
                        @for step in &scenario.steps {
                            (step_row(step, locale))
                        }
                    }
                }
            }
        }
    }
}

fn step_row(step: &StepDetail, locale: &str) -> Markup {
    let status_class = format!("step-{}", step.status.as_str());
    html! {
        tr {
            td {
                strong { (step.keyword) } " " (step.name)
                @if let Some(message) = &step.error_message {
                    pre.failed-text { (message) }
                }
                div.evidence {
                    @if !step.evidence.data.parameters.is_empty() {
                        div {
                            (t!("html.evidence.parameters", locale = locale)) ": "
                            (step.evidence.data.parameters.join(", "))
                        }
                    }
                    @if let Some(shot) = &step.evidence.screenshot {
                        div {
                            (t!("html.evidence.screenshot", locale = locale)) ": "
                            code { (shot.planned_path.display().to_string()) }
                            " (" (shot.message) ")"
                        }
                    }
                    @for entry in &step.evidence.logs.entries {
                        div { (entry) }
                    }
                }
            }
            td class=(status_class) { (step.status.as_str()) }
            td.duration-cell { (format!("{:.3}s", step.duration_seconds)) }
        }
    }
}

fn environment_table(environment: &EnvironmentInfo, locale: &str) -> Markup {
    html! {
        h2 { (t!("html.section.environment", locale = locale)) }
        table.environment {
            tbody {
                tr { td { (t!("html.env.platform", locale = locale)) } td { (environment.platform) } }
                tr { td { (t!("html.env.arch", locale = locale)) } td { (environment.arch) } }
                tr { td { (t!("html.env.version", locale = locale)) } td { (environment.runner_version) } }
                tr { td { (t!("html.env.working_directory", locale = locale)) } td { (environment.working_directory) } }
                tr {
                    td { (t!("html.env.timestamp", locale = locale)) }
                    td { (environment.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()) }
                }
            }
        }
    }
}
