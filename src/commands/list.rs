// src/commands/list.rs

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::{
    commands::Workspace,
    core::registry::ModuleRegistry,
    infra::{fs, t},
};

/// Options of the `list` subcommand.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub config: PathBuf,
    pub project_dir: PathBuf,
    pub lang: Option<String>,
}

/// Prints every declared module in execution order with its settings and
/// the feature files found on disk.
pub fn execute(options: ListOptions) -> Result<()> {
    let workspace = Workspace::load(&options.config, &options.project_dir, options.lang.as_deref())?;
    let locale = workspace.locale;
    let registry = ModuleRegistry::from_config(&workspace.config)?;

    let mut modules: Vec<_> = registry.all().iter().collect();
    modules.sort_by_key(|m| m.execution_order);

    println!(
        "{}",
        t!("list.banner", locale = locale, count = modules.len()).cyan().bold()
    );

    for module in modules {
        let state = if module.enabled {
            t!("list.enabled", locale = locale).green()
        } else {
            t!("list.disabled", locale = locale).dimmed()
        };
        println!(
            "\n  {} {} [{}] ({})",
            module.execution_order.to_string().bold(),
            module.name.bold(),
            state,
            module.title()
        );
        if !module.description.is_empty() {
            println!("    {}", module.description);
        }
        if !module.tags.is_empty() {
            println!(
                "    {} {}",
                t!("list.tags", locale = locale).dimmed(),
                module.tags.join(" ")
            );
        }
        if !module.dependencies.is_empty() {
            println!(
                "    {} {}",
                t!("list.dependencies", locale = locale).dimmed(),
                module.dependencies.join(", ")
            );
        }

        let features_dir = workspace.config.features_dir(&module.name);
        let features = fs::list_feature_files(&features_dir)?;
        if features.is_empty() {
            println!(
                "    {}",
                t!("list.no_features", locale = locale, path = features_dir.display()).yellow()
            );
        } else {
            println!(
                "    {}",
                t!("list.features", locale = locale, count = features.len()).dimmed()
            );
            for feature in features {
                println!("      - {}", feature);
            }
        }
    }
    Ok(())
}
