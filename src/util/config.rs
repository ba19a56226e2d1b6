//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.cement/config.toml` - User-wide defaults
//! - Workspace: `<workspace>/.cement/config.toml` - Workspace-specific overrides
//!
//! Workspace config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Directory holding cement state, both in the home and workspace roots.
pub const CEMENT_DIR: &str = ".cement";

/// Default module definition filename.
pub const DEFAULT_DEFINITION_FILE: &str = "module.yaml";

/// Default tool whose build targets are checked for references.
pub const DEFAULT_CHECK_TOOL: &str = "msbuild";

/// Cement configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace layout settings
    pub workspace: WorkspaceConfig,

    /// Dependency check settings
    pub check: CheckConfig,
}

/// Workspace layout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Module definition filename (None = `module.yaml`)
    pub definition_file: Option<String>,
}

/// Dependency check configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Build tool whose targets are scanned (None = `msbuild`)
    pub tool: Option<String>,

    /// Report every reference, not only those managed by cement (None = false)
    pub all_references: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.workspace.definition_file.is_some() {
            self.workspace.definition_file = other.workspace.definition_file;
        }

        if other.check.tool.is_some() {
            self.check.tool = other.check.tool;
        }
        if other.check.all_references.is_some() {
            self.check.all_references = other.check.all_references;
        }
    }

    /// Module definition filename.
    pub fn definition_file(&self) -> &str {
        self.workspace
            .definition_file
            .as_deref()
            .unwrap_or(DEFAULT_DEFINITION_FILE)
    }

    /// Build tool scanned by the dependency check.
    pub fn check_tool(&self) -> &str {
        self.check.tool.as_deref().unwrap_or(DEFAULT_CHECK_TOOL)
    }

    /// Whether the dependency check asks for every reference.
    pub fn all_references(&self) -> bool {
        self.check.all_references.unwrap_or(false)
    }
}

/// Load merged configuration from global and workspace locations.
///
/// Order of precedence (highest to lowest):
/// 1. Workspace config (.cement/config.toml)
/// 2. Global config (~/.cement/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, workspace_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if workspace_path.exists() {
        config.merge(Config::load_or_default(workspace_path));
    }

    config
}

/// Load the configuration that applies to a workspace root.
pub fn load_workspace_config(workspace_root: &Path) -> Config {
    let global = global_config_path();
    load_config(global.as_deref(), &workspace_config_path(workspace_root))
}

/// Get the global cement config directory (~/.cement).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CEMENT_DIR))
}

/// Get the global config path (~/.cement/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the workspace config path (.cement/config.toml).
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(CEMENT_DIR).join("config.toml")
}
