//! # Cross-Module Consolidator
//!
//! Merges the normalized results of several module runs into one
//! [`ConsolidatedReport`]. Scenarios keep module execution order, then
//! their order within the module, so consolidated output is diff-stable.

use chrono::{DateTime, Local};

use crate::core::models::{
    AggregateMetrics, ConsolidatedReport, ModuleLine, ModuleRunOutcome, ModuleSummary,
    NormalizedScenarioResult,
};

/// Consolidates `outcomes` using the current time as generation time.
pub fn consolidate(outcomes: &[ModuleRunOutcome]) -> ConsolidatedReport {
    consolidate_at(outcomes, Local::now())
}

/// Consolidates `outcomes`. The per-module reports are cloned, never
/// modified, and the metrics are rebuilt from the merged scenario list
/// rather than summed from per-module metrics.
pub fn consolidate_at(outcomes: &[ModuleRunOutcome], now: DateTime<Local>) -> ConsolidatedReport {
    let scenarios: Vec<NormalizedScenarioResult> = outcomes
        .iter()
        .flat_map(|outcome| {
            outcome.scenarios().iter().cloned().map(|mut scenario| {
                tag_with_module(&mut scenario, &outcome.module_name);
                scenario
            })
        })
        .collect();

    let module_results = outcomes
        .iter()
        .map(|outcome| ModuleLine {
            module_name: outcome.module_name.clone(),
            succeeded: outcome.succeeded,
            scenario_count: outcome.scenarios().len(),
            failure: outcome.failure.clone(),
        })
        .collect();

    ConsolidatedReport {
        metrics: AggregateMetrics::from_scenarios(&scenarios, now),
        modules: ModuleSummary::from_outcomes(outcomes),
        module_results,
        scenarios,
    }
}

/// Attaches `module_name` unless the scenario is already attributed.
pub fn tag_with_module(scenario: &mut NormalizedScenarioResult, module_name: &str) {
    if scenario.module_name.is_none() {
        scenario.module_name = Some(module_name.to_string());
    }
}

impl ModuleSummary {
    pub fn from_outcomes(outcomes: &[ModuleRunOutcome]) -> Self {
        let total_modules = outcomes.len();
        let successful_modules = outcomes.iter().filter(|o| o.succeeded).count();
        let success_rate = if total_modules == 0 {
            0.0
        } else {
            successful_modules as f64 / total_modules as f64 * 100.0
        };

        Self {
            total_modules,
            successful_modules,
            failed_modules: total_modules - successful_modules,
            success_rate,
        }
    }

    /// `true` when every module succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed_modules == 0
    }
}
