//! # Suite Initialization Module
//!
//! Creates a `SuiteRunner.toml` for a new project, either from defaults or
//! through a short interactive wizard, and lays out the module directories
//! it declares.

use anyhow::{Context, Result, bail};
use colored::*;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{EngineConfig, ModuleDescriptor, SuiteConfig};
use crate::infra::t;

const CONFIG_HEADER: &str = "\
# Suite Runner configuration.
#
# engine.command placeholders: {features}, {outfile}, {module}.
# Each [[modules]] entry maps to <modules_dir>/<name>/features (and steps).
# Modules run one at a time in ascending execution_order.";

/// Options of the `init` subcommand.
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub config: PathBuf,
    pub non_interactive: bool,
    /// Overwrite an existing configuration without asking.
    pub force: bool,
    pub locale: String,
}

pub fn execute(options: InitOptions) -> Result<()> {
    let language = options.locale.as_str();
    let config_path = options.config.as_path();
    let theme = ColorfulTheme::default();

    if !options.non_interactive {
        println!("\n{}", t!("init.welcome", locale = language).cyan().bold());
        println!("{}", t!("init.description", locale = language));
    }

    if config_path.exists() && !options.force {
        if options.non_interactive {
            bail!(
                "{}",
                t!("init.exists_use_force", locale = language, path = config_path.display())
            );
        }
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", locale = language, path = config_path.display()))
            .default(false)
            .interact()
            .context(t!("init.confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let suite = if options.non_interactive {
        default_suite()
    } else {
        prompt_suite(&theme, language)?
    };

    write_config(config_path, &suite, language)?;

    let project_root = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    create_module_dirs(project_root, &suite, language)
}

/// The configuration written by `init --non-interactive`.
pub fn default_suite() -> SuiteConfig {
    SuiteConfig {
        language: None,
        modules_dir: PathBuf::from("modules"),
        report_dir: PathBuf::from("reports"),
        timeout_secs: 300,
        engine: EngineConfig::default(),
        modules: vec![
            ModuleDescriptor {
                name: "login".to_string(),
                display_name: Some("Login".to_string()),
                description: "Authentication against the target application".to_string(),
                tags: vec!["@login".to_string()],
                execution_order: 1,
                ..ModuleDescriptor::default()
            },
            ModuleDescriptor {
                name: "sales".to_string(),
                display_name: Some("Sales".to_string()),
                description: "Sales order workflows".to_string(),
                tags: vec!["@sales".to_string()],
                dependencies: vec!["login".to_string()],
                execution_order: 2,
                ..ModuleDescriptor::default()
            },
        ],
    }
}

fn prompt_suite(theme: &ColorfulTheme, language: &str) -> Result<SuiteConfig> {
    let names: String = Input::with_theme(theme)
        .with_prompt(t!("init.modules_prompt", locale = language))
        .default("login, sales".to_string())
        .interact_text()?;
    let command: String = Input::with_theme(theme)
        .with_prompt(t!("init.engine_prompt", locale = language))
        .default(EngineConfig::default().command)
        .interact_text()?;
    let timeout_secs: u64 = Input::with_theme(theme)
        .with_prompt(t!("init.timeout_prompt", locale = language))
        .default(300)
        .validate_with(|value: &u64| {
            if *value > 0 {
                Ok(())
            } else {
                Err("timeout must be greater than zero")
            }
        })
        .interact_text()?;

    let mut modules: Vec<ModuleDescriptor> = Vec::new();
    for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if modules.iter().any(|m| m.name == name) {
            continue;
        }
        modules.push(ModuleDescriptor {
            name: name.to_string(),
            execution_order: modules.len() as i64 + 1,
            ..ModuleDescriptor::default()
        });
    }
    if modules.is_empty() {
        println!("{}", t!("init.no_modules_entered", locale = language).yellow());
        modules = default_suite().modules;
    }

    let suite = SuiteConfig {
        language: Some(language.to_string()),
        timeout_secs,
        engine: EngineConfig {
            command,
            ..EngineConfig::default()
        },
        modules,
        ..default_suite()
    };
    suite.validate()?;
    Ok(suite)
}

fn write_config(path: &Path, suite: &SuiteConfig, language: &str) -> Result<()> {
    let toml_string = toml::to_string_pretty(suite)
        .context(t!("init.serialize_failed", locale = language).to_string())?;
    let content = format!("{}\n\n{}", CONFIG_HEADER, toml_string);

    fs::write(path, content)
        .with_context(|| t!("init.write_failed", locale = language, path = path.display()).to_string())?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success_created", locale = language, path = path.display()).bold()
    );
    println!("{}", t!("init.usage_hint", locale = language));

    Ok(())
}

/// Creates `<modules_dir>/<module>/features` and `steps` for every module.
fn create_module_dirs(project_root: &Path, suite: &SuiteConfig, language: &str) -> Result<()> {
    for module in &suite.modules {
        let module_dir = project_root.join(&suite.modules_dir).join(&module.name);
        for sub in ["features", "steps"] {
            crate::infra::fs::ensure_dir(&module_dir.join(sub))?;
        }
        println!(
            "  {}",
            t!("init.module_dir_created", locale = language, path = module_dir.display()).dimmed()
        );
    }
    Ok(())
}
