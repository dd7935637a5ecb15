//! # Commands Module
//!
//! One submodule per CLI subcommand, plus the setup they share: locating
//! the project, loading the suite configuration and picking the locale.

pub mod init;
pub mod list;
pub mod report;
pub mod run;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::core::config::SuiteConfig;
use crate::infra::{fs, t};

/// Configuration file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "SuiteRunner.toml";

/// A loaded project: its root, its resolved configuration and the locale
/// used for every message of the command.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub config: SuiteConfig,
    pub locale: &'static str,
}

impl Workspace {
    /// Loads the configuration for a command.
    ///
    /// A relative `config` is looked up under the project directory first,
    /// then relative to the current directory. The locale is `lang` if
    /// given, else the configured language, else the system locale.
    pub fn load(config: &Path, project_dir: &Path, lang: Option<&str>) -> Result<Self> {
        let project_root = fs::absolute_path(project_dir).with_context(|| {
            t!("setup.project_dir_not_found", path = project_dir.display()).to_string()
        })?;

        let config_path = locate_config(config, &project_root);
        let mut suite = SuiteConfig::load(&config_path)?;
        suite.resolve_paths(&project_root)?;

        let locale = match lang.or(suite.language.as_deref()) {
            Some(requested) => crate::resolve_locale(requested),
            None => crate::system_locale(),
        };
        rust_i18n::set_locale(locale);

        Ok(Self {
            project_root,
            config_path,
            config: suite,
            locale,
        })
    }
}

fn locate_config(config: &Path, project_root: &Path) -> PathBuf {
    if config.is_absolute() {
        return config.to_path_buf();
    }
    let in_project = project_root.join(config);
    if in_project.exists() {
        in_project
    } else {
        config.to_path_buf()
    }
}
