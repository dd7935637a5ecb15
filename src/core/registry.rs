//! # Module Registry
//!
//! Static view of the declared modules: which are enabled, in what order
//! they run and what they depend on.

use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::config::{ModuleDescriptor, SuiteConfig};
use crate::infra::fs::sanitize_component;

#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    /// Builds a registry, rejecting duplicate module names and names that
    /// map to the same report directory.
    pub fn new(modules: Vec<ModuleDescriptor>) -> Result<Self> {
        let mut seen: BTreeMap<String, &str> = BTreeMap::new();
        for module in &modules {
            let component = sanitize_component(&module.name);
            if let Some(other) = seen.insert(component.clone(), module.name.as_str()) {
                if other == module.name {
                    bail!("module '{}' is declared more than once", module.name);
                }
                bail!(
                    "modules '{}' and '{}' would share the report directory '{}'",
                    other,
                    module.name,
                    component
                );
            }
        }
        Ok(Self { modules })
    }

    pub fn from_config(config: &SuiteConfig) -> Result<Self> {
        Self::new(config.modules.clone())
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|module| module.name == name)
    }

    /// Every declared module in declaration order.
    pub fn all(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|module| module.name.as_str())
    }

    /// Enabled modules sorted ascending by `execution_order`. The sort is
    /// stable, so equal orders keep declaration order.
    pub fn enabled_modules(&self) -> Vec<&ModuleDescriptor> {
        let mut enabled: Vec<_> = self.modules.iter().filter(|m| m.enabled).collect();
        enabled.sort_by_key(|module| module.execution_order);
        enabled
    }

    pub fn enabled_names(&self) -> BTreeSet<String> {
        self.modules
            .iter()
            .filter(|m| m.enabled)
            .map(|m| m.name.clone())
            .collect()
    }

    /// Declared dependencies of `name`.
    ///
    /// An unknown module yields an empty set instead of an error, so a
    /// misspelled module name passes `validate`.
    pub fn dependencies_of(&self, name: &str) -> BTreeSet<String> {
        self.get(name)
            .map(|module| module.dependencies.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Dependencies of `name` missing from `enabled`. Empty means the
    /// module can run.
    pub fn validate(&self, name: &str, enabled: &BTreeSet<String>) -> BTreeSet<String> {
        self.dependencies_of(name)
            .into_iter()
            .filter(|dependency| !enabled.contains(dependency))
            .collect()
    }
}
