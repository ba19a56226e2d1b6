//! On-disk workspace fixtures.

use std::path::Path;

use tempfile::TempDir;

use crate::core::workspace::Workspace;
use crate::util::config::{load_config, workspace_config_path, CEMENT_DIR, DEFAULT_DEFINITION_FILE};

/// A temporary workspace built up module by module.
///
/// The directory is removed when the fixture is dropped.
#[derive(Debug)]
pub struct WorkspaceFixture {
    dir: TempDir,
}

impl WorkspaceFixture {
    /// Create an empty workspace with a `.cement` marker.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join(CEMENT_DIR)).expect("failed to create .cement");
        WorkspaceFixture { dir }
    }

    /// Add a module with a definition file.
    pub fn module(self, name: &str, definition: &str) -> Self {
        self.file(name, DEFAULT_DEFINITION_FILE, definition)
    }

    /// Add a module directory without a definition.
    pub fn module_dir(self, name: &str) -> Self {
        std::fs::create_dir_all(self.dir.path().join(name)).expect("failed to create module dir");
        self
    }

    /// Add a file under a workspace directory.
    pub fn file(self, dir: &str, relative: &str, contents: &str) -> Self {
        let path = self.dir.path().join(dir).join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture file");
        self
    }

    /// Write the workspace configuration file.
    pub fn config(self, toml: &str) -> Self {
        self.file(CEMENT_DIR, "config.toml", toml)
    }

    /// Workspace root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open the workspace, ignoring the user's global configuration.
    pub fn workspace(&self) -> Workspace {
        let config = load_config(None, &workspace_config_path(self.path()));
        Workspace::with_config(self.path(), &config)
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}
