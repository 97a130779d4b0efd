//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/clearsel/clearsel.toml`
//! 3. Local config: `<project_dir>/.clearsel.toml`
//! 4. Environment variables: `CLEARSEL_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::EligibilityLabels;

/// Indicator glyphs and tree-printer options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub checked: String,
    pub unchecked: String,
    pub indeterminate: String,
    /// Print node ids next to labels
    pub show_ids: bool,
    /// Print the eligibility of trade orders
    pub show_eligibility: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            checked: "[x]".into(),
            unchecked: "[ ]".into(),
            indeterminate: "[-]".into(),
            show_ids: false,
            show_eligibility: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplayConfig {
    pub checked: Option<String>,
    pub unchecked: Option<String>,
    pub indeterminate: Option<String>,
    pub show_ids: Option<bool>,
    pub show_eligibility: Option<bool>,
}

impl DisplayConfig {
    /// Scalars only, so global and local layers use the same rule: overlay wins if set.
    pub fn merge(&self, overlay: &RawDisplayConfig) -> Self {
        Self {
            checked: overlay.checked.clone().unwrap_or_else(|| self.checked.clone()),
            unchecked: overlay
                .unchecked
                .clone()
                .unwrap_or_else(|| self.unchecked.clone()),
            indeterminate: overlay
                .indeterminate
                .clone()
                .unwrap_or_else(|| self.indeterminate.clone()),
            show_ids: overlay.show_ids.unwrap_or(self.show_ids),
            show_eligibility: overlay.show_eligibility.unwrap_or(self.show_eligibility),
        }
    }
}

/// Status labels recognized when loading trade orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Labels meaning "instruction not generated yet"
    pub actionable_labels: Vec<String>,
    /// Labels meaning "instruction already generated"
    pub completed_labels: Vec<String>,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        let labels = EligibilityLabels::default();
        Self {
            actionable_labels: labels.actionable,
            completed_labels: labels.completed,
        }
    }
}

/// Raw eligibility config (arrays are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawEligibilityConfig {
    pub actionable_labels: Option<Vec<String>>,
    pub completed_labels: Option<Vec<String>>,
}

impl EligibilityConfig {
    /// Union `overlay` into `base`; `!item` removes an inherited item.
    ///
    /// ```ignore
    /// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for item in overlay {
            if let Some(negated) = item.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(item.clone());
            }
        }

        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Local layer: arrays union with negation.
    pub fn merge(&self, overlay: &RawEligibilityConfig) -> Self {
        Self {
            actionable_labels: overlay
                .actionable_labels
                .as_ref()
                .map(|o| Self::merge_array(&self.actionable_labels, o))
                .unwrap_or_else(|| self.actionable_labels.clone()),
            completed_labels: overlay
                .completed_labels
                .as_ref()
                .map(|o| Self::merge_array(&self.completed_labels, o))
                .unwrap_or_else(|| self.completed_labels.clone()),
        }
    }

    /// Global layer: a specified array replaces the default entirely.
    pub fn apply_global(&self, global: &RawEligibilityConfig) -> Self {
        Self {
            actionable_labels: global
                .actionable_labels
                .clone()
                .unwrap_or_else(|| self.actionable_labels.clone()),
            completed_labels: global
                .completed_labels
                .clone()
                .unwrap_or_else(|| self.completed_labels.clone()),
        }
    }

    pub fn to_labels(&self) -> EligibilityLabels {
        EligibilityLabels {
            actionable: self.actionable_labels.clone(),
            completed: self.completed_labels.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionVariant {
    /// Disabled while nothing is selected
    Primary,
    Secondary,
}

/// One entry of the bulk-action catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionSpec {
    pub key: String,
    pub label: String,
    pub variant: ActionVariant,
}

impl ActionSpec {
    pub fn new(key: &str, label: &str, variant: ActionVariant) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            variant,
        }
    }
}

/// The clearing workstation's action bar.
pub fn default_actions() -> Vec<ActionSpec> {
    use ActionVariant::{Primary, Secondary};
    vec![
        ActionSpec::new("accountingInitiate", "申请核算发起流程", Primary),
        ActionSpec::new("accountingCancel", "申请核算撤销流程", Secondary),
        ActionSpec::new("accountingManual", "申请核算手动流程", Secondary),
        ActionSpec::new("accountingDept", "申请核算部流程", Secondary),
        ActionSpec::new("noGeneration", "无需生成", Secondary),
        ActionSpec::new("dvpTransfer", "DVP互转", Secondary),
        ActionSpec::new("autoClearing", "自动清算", Primary),
        ActionSpec::new("securityDelivery", "证券交收", Secondary),
        ActionSpec::new("setDelivery", "置为交收", Secondary),
    ]
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub source: Option<PathBuf>,
    pub display: RawDisplayConfig,
    pub eligibility: RawEligibilityConfig,
    pub actions: Option<Vec<ActionSpec>>,
}

/// Unified configuration for clearsel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Forest file used when a command gets no FILE argument
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub display: DisplayConfig,
    pub eligibility: EligibilityConfig,
    pub actions: Vec<ActionSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: None,
            display: DisplayConfig::default(),
            eligibility: EligibilityConfig::default(),
            actions: default_actions(),
        }
    }
}

/// XDG config directory for clearsel.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "clearsel").map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("clearsel.toml"))
}

pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".clearsel.toml")
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// `CLEARSEL_DISPLAY__SHOW_IDS=true` → `display.show_ids`.
pub fn env_overrides() -> Environment {
    Environment::with_prefix("CLEARSEL")
        .prefix_separator("_")
        .separator("__")
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with `!item` negation
    /// - Any → Env vars: REPLACE, comma separated
    ///
    /// An `[[actions]]` catalog in any layer replaces the inherited one.
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_with(global_config_path().as_deref(), project_dir, env_overrides())
    }

    /// `load` with explicit global path and environment source.
    pub fn load_with(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!(path = %global_path.display(), "applying global config");
                let raw = load_raw_settings(global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(project) = project_dir {
            let local_path = local_config_path(project);
            if local_path.exists() {
                debug!(path = %local_path.display(), "merging local config");
                let mut raw = load_raw_settings(&local_path)?;
                // A relative source in a project file is relative to that project.
                raw.source = raw.source.map(|s| {
                    if s.is_relative() && !s.starts_with("~") && !s.to_string_lossy().starts_with('$') {
                        project.join(s)
                    } else {
                        s
                    }
                });
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current, env)?;
        current.expand_paths();

        Ok(current)
    }

    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            source: global.source.clone().or_else(|| self.source.clone()),
            display: self.display.merge(&global.display),
            eligibility: self.eligibility.apply_global(&global.eligibility),
            actions: global.actions.clone().unwrap_or_else(|| self.actions.clone()),
        }
    }

    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            source: overlay.source.clone().or_else(|| self.source.clone()),
            display: self.display.merge(&overlay.display),
            eligibility: self.eligibility.merge(&overlay.eligibility),
            actions: overlay.actions.clone().unwrap_or_else(|| self.actions.clone()),
        }
    }

    /// Apply CLEARSEL_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder().add_source(env).build().map_err(config_err)?;

        if let Ok(val) = config.get_string("source") {
            settings.source = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("display.checked") {
            settings.display.checked = val;
        }
        if let Ok(val) = config.get_string("display.unchecked") {
            settings.display.unchecked = val;
        }
        if let Ok(val) = config.get_string("display.indeterminate") {
            settings.display.indeterminate = val;
        }
        if let Ok(val) = config.get_bool("display.show_ids") {
            settings.display.show_ids = val;
        }
        if let Ok(val) = config.get_bool("display.show_eligibility") {
            settings.display.show_eligibility = val;
        }
        if let Ok(val) = config.get_string("eligibility.actionable_labels") {
            settings.eligibility.actionable_labels = split_list(&val);
        }
        if let Ok(val) = config.get_string("eligibility.completed_labels") {
            settings.eligibility.completed_labels = split_list(&val);
        }

        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in `source`.
    fn expand_paths(&mut self) {
        if let Some(source) = self.source.take() {
            let raw = source.to_string_lossy().into_owned();
            let expanded = shellexpand::full(&raw)
                .map(|s| s.into_owned())
                .unwrap_or(raw);
            self.source = Some(PathBuf::from(expanded));
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# clearsel configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/clearsel/clearsel.toml  (defines your baseline)
#   Local:  <project_dir>/.clearsel.toml      (project-specific additions)
#   Env:    CLEARSEL_* environment variables  (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global. Use "!label" to REMOVE an inherited label:
#     completed_labels = ["done", "!generated"]

# Forest file used when no FILE argument is given
# source = "~/clearing/funds.json"

[display]
# checked = "[x]"
# unchecked = "[ ]"
# indeterminate = "[-]"
# show_ids = false
# show_eligibility = true

[eligibility]
# Trade-order status labels that still need an instruction
# actionable_labels = ["未生成", "not generated"]

# Trade-order status labels whose instruction exists already
# completed_labels = ["已生成", "generated"]

# Bulk-action catalog; a catalog in any file replaces the inherited one.
# Primary actions are disabled while nothing is selected.
# [[actions]]
# key = "autoClearing"
# label = "自动清算"
# variant = "primary"
"#
        .to_string()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
