//! # Execution Planner Module
//!
//! This module decides which modules a run executes and in what order,
//! checking every module's declared dependencies on the way.

use anyhow::{Result, bail};
use std::collections::BTreeSet;

use crate::core::config::ModuleDescriptor;
use crate::core::registry::ModuleRegistry;

/// Which modules the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSelection {
    /// Every enabled module.
    All,
    /// Exactly these modules, enabled or not.
    Only(Vec<String>),
}

/// A module slot in the plan.
#[derive(Debug, Clone)]
pub struct PlannedModule {
    pub descriptor: ModuleDescriptor,
    /// Dependencies that are not satisfied. Non-empty means the module is
    /// reported as failed without being executed.
    pub missing_dependencies: BTreeSet<String>,
}

impl PlannedModule {
    pub fn is_runnable(&self) -> bool {
        self.missing_dependencies.is_empty()
    }
}

/// Represents a complete execution plan for a run.
#[derive(Debug)]
pub struct ExecutionPlan {
    /// Modules in execution order, including blocked ones so that they are
    /// reported in their natural position.
    pub modules: Vec<PlannedModule>,
    /// The number of declared modules left out because they are disabled.
    pub disabled_count: usize,
    /// Explicitly selected modules that are disabled in the configuration.
    pub forced_disabled: Vec<String>,
}

impl ExecutionPlan {
    pub fn runnable_count(&self) -> usize {
        self.modules.iter().filter(|m| m.is_runnable()).count()
    }

    pub fn blocked(&self) -> impl Iterator<Item = &PlannedModule> {
        self.modules.iter().filter(|m| !m.is_runnable())
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Creates an execution plan for `selection`.
///
/// For a full run, a module's dependencies must be enabled *and* scheduled
/// before it; a dependency that is blocked blocks its dependents as well.
/// For an explicit selection, dependencies are only checked against the
/// enabled set, since they may have been exercised by an earlier run.
pub fn plan_execution(registry: &ModuleRegistry, selection: &ModuleSelection) -> Result<ExecutionPlan> {
    let enabled = registry.enabled_names();

    match selection {
        ModuleSelection::All => {
            let mut scheduled = BTreeSet::new();
            let mut modules = Vec::new();

            for descriptor in registry.enabled_modules() {
                let missing: BTreeSet<String> = registry
                    .dependencies_of(&descriptor.name)
                    .into_iter()
                    .filter(|dependency| !scheduled.contains(dependency))
                    .collect();
                if missing.is_empty() {
                    scheduled.insert(descriptor.name.clone());
                }
                modules.push(PlannedModule {
                    descriptor: descriptor.clone(),
                    missing_dependencies: missing,
                });
            }

            Ok(ExecutionPlan {
                modules,
                disabled_count: registry.all().len() - enabled.len(),
                forced_disabled: Vec::new(),
            })
        }
        ModuleSelection::Only(names) => {
            if names.is_empty() {
                bail!("At least one module must be selected.");
            }

            let mut selected = Vec::new();
            for name in names {
                let Some(descriptor) = registry.get(name) else {
                    bail!("Unknown module '{}'.", name);
                };
                if !selected.iter().any(|d: &&ModuleDescriptor| d.name == *name) {
                    selected.push(descriptor);
                }
            }
            selected.sort_by_key(|descriptor| descriptor.execution_order);

            let forced_disabled = selected
                .iter()
                .filter(|d| !d.enabled)
                .map(|d| d.name.clone())
                .collect();

            let modules = selected
                .into_iter()
                .map(|descriptor| PlannedModule {
                    missing_dependencies: registry.validate(&descriptor.name, &enabled),
                    descriptor: descriptor.clone(),
                })
                .collect();

            Ok(ExecutionPlan {
                modules,
                disabled_count: 0,
                forced_disabled,
            })
        }
    }
}
