//! Workspace - the directory holding every module side by side.
//!
//! Each direct subdirectory of the root is a module; a module may carry a
//! definition file at a fixed name. A workspace root is marked by a
//! `.cement` directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use walkdir::WalkDir;

use crate::core::definition::ModuleDefinition;
use crate::util::config::{load_workspace_config, CEMENT_DIR};
use crate::util::Config;

/// A workspace root and the configuration that applies to it.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Workspace root directory
    root: PathBuf,

    /// Merged configuration
    config: Config,
}

impl Workspace {
    /// Open a workspace, reading global and workspace configuration files.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config = load_workspace_config(&root);
        Workspace { root, config }
    }

    /// Open a workspace with an explicit configuration.
    pub fn with_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        Workspace {
            root: root.into(),
            config: config.clone(),
        }
    }

    /// Find the workspace enclosing `cwd` by walking up to a directory
    /// containing `.cement`.
    pub fn discover(cwd: &Path) -> Result<Self> {
        for dir in cwd.ancestors() {
            if dir.join(CEMENT_DIR).is_dir() {
                tracing::debug!("found workspace at {}", dir.display());
                return Ok(Workspace::new(dir));
            }
        }
        bail!(
            "could not find a cement workspace in `{}` or any parent directory",
            cwd.display()
        )
    }

    /// Get the workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the .cement directory.
    pub fn cement_dir(&self) -> PathBuf {
        self.root.join(CEMENT_DIR)
    }

    /// Names of all modules, sorted. Hidden directories are skipped.
    pub fn modules(&self) -> Result<Vec<String>> {
        let mut modules = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            modules.push(name.into_owned());
        }
        Ok(modules)
    }

    /// Directory of a module.
    pub fn module_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Check if a module directory exists.
    pub fn module_exists(&self, name: &str) -> bool {
        self.module_dir(name).is_dir()
    }

    /// Path of a module's definition file.
    pub fn definition_path(&self, name: &str) -> PathBuf {
        self.module_dir(name).join(self.config.definition_file())
    }

    /// Check if a module has a definition file.
    pub fn has_definition(&self, name: &str) -> bool {
        self.definition_path(name).is_file()
    }

    /// Parse a module's definition. Returns `None` when the file is absent.
    pub fn load_definition(&self, name: &str) -> Result<Option<ModuleDefinition>> {
        let path = self.definition_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        ModuleDefinition::load(&path).map(Some)
    }

    /// Absolute paths of the distinct solution files built by any
    /// configuration of a module.
    pub fn solution_list(&self, name: &str) -> Result<Vec<PathBuf>> {
        let Some(definition) = self.load_definition(name)? else {
            return Ok(Vec::new());
        };

        let module_dir = self.module_dir(name);
        let mut solutions: Vec<PathBuf> = Vec::new();
        for target in definition.build_targets().filter(|t| t.is_solution()) {
            let path = module_dir.join(&target.target);
            if !solutions.contains(&path) {
                solutions.push(path);
            }
        }
        Ok(solutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(tmp: &TempDir) -> Workspace {
        Workspace::with_config(tmp.path(), &Config::default())
    }

    #[test]
    fn test_modules_are_sorted_directories() {
        let tmp = TempDir::new().unwrap();
        for dir in ["zeta", "alpha", ".cement", ".git"] {
            std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        std::fs::write(tmp.path().join("readme.txt"), "").unwrap();

        let ws = workspace(&tmp);
        assert_eq!(ws.modules().unwrap(), vec!["alpha", "zeta"]);
        assert!(ws.module_exists("alpha"));
        assert!(!ws.module_exists("readme.txt"));
        assert!(!ws.module_exists("missing"));
    }

    #[test]
    fn test_load_definition_absent_is_none() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("core")).unwrap();

        let ws = workspace(&tmp);
        assert!(!ws.has_definition("core"));
        assert!(ws.load_definition("core").unwrap().is_none());
    }

    #[test]
    fn test_custom_definition_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("core")).unwrap();
        std::fs::write(tmp.path().join("core").join("module.yml"), "full-build:\n").unwrap();

        let mut config = Config::default();
        config.workspace.definition_file = Some("module.yml".to_string());
        let ws = Workspace::with_config(tmp.path(), &config);

        let definition = ws.load_definition("core").unwrap().unwrap();
        assert!(definition.has_configuration("full-build"));
    }

    #[test]
    fn test_discover_walks_up() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".cement")).unwrap();
        let nested = tmp.path().join("core").join("src");
        std::fs::create_dir_all(&nested).unwrap();

        let ws = Workspace::discover(&nested).unwrap();
        assert_eq!(ws.root(), tmp.path());
    }

    #[test]
    fn test_solution_list() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("core")).unwrap();
        std::fs::write(
            tmp.path().join("core").join("module.yaml"),
            r#"
client:
  build:
    target: Core.sln
full-build > client:
  build:
    - target: Core.sln
      configuration: Debug
    - target: Tools/Tools.csproj
sdk:
  build:
    target: None
"#,
        )
        .unwrap();

        let ws = workspace(&tmp);
        assert_eq!(
            ws.solution_list("core").unwrap(),
            vec![tmp.path().join("core").join("Core.sln")]
        );
    }
}
