//! Test utilities and mocks for unit tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::{MockReferenceExtractor, WorkspaceFixture};
//!
//! #[test]
//! fn test_example() {
//!     let fixture = WorkspaceFixture::new()
//!         .module("App", "full-build:\n  deps:\n    - Lib\n  build:\n    target: App.sln\n")
//!         .module("Lib", "full-build:\n  install:\n    - Lib.dll\n");
//!
//!     let extractor = MockReferenceExtractor::new()
//!         .project("App.sln", "App/App.csproj")
//!         .reference("App/App.csproj", "Lib/Lib.dll");
//!
//!     // Run a check against fixture.workspace()...
//! }
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::build::BuildTarget;
use crate::ops::check_deps::ReferenceExtractor;

// Re-export fixtures for convenience
pub use fixtures::*;

/// Mock reference extractor answering from canned tables.
///
/// Projects are looked up by build target, references by project path.
/// Unknown targets and projects are errors.
#[derive(Debug, Default)]
pub struct MockReferenceExtractor {
    projects: HashMap<String, Vec<PathBuf>>,
    references: HashMap<PathBuf, Vec<String>>,
    configurations: RefCell<Vec<String>>,
}

impl MockReferenceExtractor {
    /// Create an extractor with no projects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project built by a target.
    pub fn project(mut self, target: &str, project: impl Into<PathBuf>) -> Self {
        let project = project.into();
        self.references.entry(project.clone()).or_default();
        self.projects
            .entry(target.to_string())
            .or_default()
            .push(project);
        self
    }

    /// Register a reference declared by a project.
    pub fn reference(mut self, project: impl Into<PathBuf>, reference: &str) -> Self {
        self.references
            .entry(project.into())
            .or_default()
            .push(reference.to_string());
        self
    }

    /// Tool configurations passed to `references`, in call order.
    pub fn requested_configurations(&self) -> Vec<String> {
        self.configurations.borrow().clone()
    }
}

impl ReferenceExtractor for MockReferenceExtractor {
    fn projects(&self, _solution: &Path, target: &BuildTarget) -> Result<Vec<PathBuf>> {
        match self.projects.get(&target.target) {
            Some(projects) => Ok(projects.clone()),
            None => bail!("no mock projects for target: {}", target.target),
        }
    }

    fn references(
        &self,
        project: &Path,
        configuration: &str,
        _all_references: bool,
    ) -> Result<Vec<String>> {
        self.configurations
            .borrow_mut()
            .push(configuration.to_string());
        match self.references.get(project) {
            Some(references) => Ok(references.clone()),
            None => bail!("no mock references for project: {}", project.display()),
        }
    }
}

/// Assertion helpers for testing.
pub mod assertions {
    /// Assert that an error message contains a substring.
    pub fn assert_error_contains<T: std::fmt::Debug>(
        result: anyhow::Result<T>,
        substring: &str,
    ) {
        match result {
            Ok(v) => panic!("expected Err containing '{}', got Ok: {:?}", substring, v),
            Err(e) => {
                let msg = format!("{:#}", e);
                assert!(
                    msg.contains(substring),
                    "error '{}' does not contain '{}'",
                    msg,
                    substring
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_fixture_layout() {
        let fixture = WorkspaceFixture::new()
            .module("core", "full-build:\n")
            .module_dir("bare")
            .config("[check]\ntool = \"dotnet\"\n");

        assert!(fixture.path().join(".cement").is_dir());
        assert!(fixture.path().join("core").join("module.yaml").is_file());

        let ws = fixture.workspace();
        assert_eq!(ws.modules().unwrap(), vec!["bare", "core"]);
        assert_eq!(ws.config().check_tool(), "dotnet");
    }

    #[test]
    fn test_mock_extractor() {
        let extractor = MockReferenceExtractor::new()
            .project("App.sln", "App/App.csproj")
            .reference("App/App.csproj", "Lib/Lib.dll");

        let projects = extractor
            .projects(Path::new("/ws/App/App.sln"), &BuildTarget::new("App.sln"))
            .unwrap();
        assert_eq!(projects, vec![PathBuf::from("App/App.csproj")]);

        let references = extractor.references(&projects[0], "Release", false).unwrap();
        assert_eq!(references, vec!["Lib/Lib.dll"]);
        assert_eq!(extractor.requested_configurations(), vec!["Release"]);

        assert!(extractor
            .projects(Path::new("/ws/App/Other.sln"), &BuildTarget::new("Other.sln"))
            .is_err());
    }

    #[test]
    fn test_assert_error_contains() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("module `x` not found"));
        assertions::assert_error_contains(result, "not found");
    }
}
