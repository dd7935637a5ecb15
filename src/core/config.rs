use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::fs::sanitize_component;

/// Default engine invocation: behave with its JSON formatter writing the
/// raw run record to `{outfile}`.
pub const DEFAULT_ENGINE_COMMAND: &str = "python -m behave {features} --no-capture --format json.pretty --outfile {outfile} --define module_name={module}";

/// A single test module declared in the suite configuration.
/// Each module is an independently executable directory of feature files.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModuleDescriptor {
    /// Unique module identifier; also the directory name under `modules_dir`.
    pub name: String,
    /// Human-friendly title shown in reports. Defaults to `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Informational tags (e.g. `@login`) shown by `list`.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Modules that must be enabled and scheduled before this one.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Ascending execution position.
    #[serde(default)]
    pub execution_order: i64,
    /// Per-module override of the global timeout, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ModuleDescriptor {
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl Default for ModuleDescriptor {
    fn default() -> Self {
        Self {
            name: "unknown".to_string(),
            display_name: None,
            description: String::new(),
            tags: vec![],
            dependencies: vec![],
            enabled: true,
            execution_order: 0,
            timeout_secs: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// How the external BDD engine is invoked.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Command line template. `{features}`, `{outfile}` and `{module}` are
    /// replaced inside each argument after the line is split.
    #[serde(default = "default_engine_command")]
    pub command: String,
    /// Flag used to forward a tag expression, e.g. `--tags`.
    #[serde(default = "default_tags_flag")]
    pub tags_flag: String,
    /// Flag used to forward a module's `steps/` directory when it exists.
    #[serde(default = "default_steps_flag")]
    pub steps_flag: Option<String>,
    /// Extra environment for the engine process (connection names,
    /// credentials for the GUI driver, ...). Values are passed through untouched.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            tags_flag: default_tags_flag(),
            steps_flag: default_steps_flag(),
            env: BTreeMap::new(),
        }
    }
}

fn default_engine_command() -> String {
    DEFAULT_ENGINE_COMMAND.to_string()
}

fn default_tags_flag() -> String {
    "--tags".to_string()
}

fn default_steps_flag() -> Option<String> {
    Some("--steps".to_string())
}

/// Represents the entire suite configuration, loaded from a TOML file.
/// It is constructed once and passed down explicitly; nothing reads
/// configuration from global state.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SuiteConfig {
    /// The language for the runner's output messages (e.g., "en", "es").
    /// Unset means the system locale.
    #[serde(default)]
    pub language: Option<String>,
    /// Directory holding one sub-directory per module.
    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,
    /// Root directory for raw records and rendered reports.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    /// Wall-clock budget for one module run, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Every declared module, enabled or not.
    pub modules: Vec<ModuleDescriptor>,
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from("modules")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_timeout_secs() -> u64 {
    300
}

impl SuiteConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SuiteConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }

    /// Rejects configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        if self.engine.command.trim().is_empty() {
            bail!("engine.command must not be empty");
        }
        // Keyed by report directory name; see `infra::fs::sanitize_component`.
        let mut seen: HashMap<String, &str> = HashMap::new();
        for module in &self.modules {
            if module.name.trim().is_empty() {
                bail!("every module needs a non-empty name");
            }
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
            if module.timeout_secs == Some(0) {
                bail!("module '{}' has a zero timeout", module.name);
            }
        }
        Ok(())
    }

    /// Expands `~` and environment variables in the directory settings and
    /// anchors relative ones at `project_root`.
    pub fn resolve_paths(&mut self, project_root: &Path) -> Result<()> {
        self.modules_dir = resolve_dir(&self.modules_dir, project_root)?;
        self.report_dir = resolve_dir(&self.report_dir, project_root)?;
        Ok(())
    }

    /// The wall-clock budget for `module`.
    pub fn module_timeout(&self, module: &ModuleDescriptor) -> Duration {
        Duration::from_secs(module.timeout_secs.unwrap_or(self.timeout_secs))
    }

    pub fn module_dir(&self, module_name: &str) -> PathBuf {
        self.modules_dir.join(module_name)
    }

    pub fn features_dir(&self, module_name: &str) -> PathBuf {
        self.module_dir(module_name).join("features")
    }

    pub fn steps_dir(&self, module_name: &str) -> PathBuf {
        self.module_dir(module_name).join("steps")
    }
}

fn resolve_dir(dir: &Path, project_root: &Path) -> Result<PathBuf> {
    let raw = dir.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path: {raw}"))?
        .to_string();
    let expanded = PathBuf::from(expanded);
    Ok(if expanded.is_absolute() {
        expanded
    } else {
        project_root.join(expanded)
    })
}
