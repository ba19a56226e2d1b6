//! Install closure resolution.
//!
//! The install data of a module configuration is expanded transitively over
//! its `module` install entries. Expansion is a breadth-first worklist; every
//! module is expanded at most once, so cyclic references terminate.

use std::collections::{HashSet, VecDeque};

use anyhow::Result;

use crate::core::dependency::{extend_unique, Dep};
use crate::core::install::InstallData;
use crate::core::workspace::Workspace;
use crate::util::diagnostic::{emit, Diagnostic};

/// Collects the install closure of one module.
pub struct InstallCollector<'a> {
    workspace: &'a Workspace,
    module: String,
}

impl<'a> InstallCollector<'a> {
    pub fn new(workspace: &'a Workspace, module: impl Into<String>) -> Self {
        InstallCollector {
            workspace,
            module: module.into(),
        }
    }

    /// Resolve install data for `configuration`, or the module default when
    /// it is `None` or empty.
    ///
    /// A module without a definition installs nothing. An unknown
    /// configuration on this module is an error; problems with external
    /// modules are reported as warnings and contribute nothing.
    pub fn collect(&self, configuration: Option<&str>) -> Result<InstallData> {
        let Some(definition) = self.workspace.load_definition(&self.module)? else {
            tracing::debug!("module `{}` has no definition, nothing to install", self.module);
            return Ok(InstallData {
                module_name: Some(self.module.clone()),
                ..InstallData::default()
            });
        };

        let mut install = definition
            .configuration_or_default(configuration)?
            .install_section
            .clone()
            .unwrap_or_default()
            .with_module_prefix(&self.module);

        let mut proceeded_modules: HashSet<String> = HashSet::from([self.module.clone()]);
        let mut proceeded_packages: HashSet<String> =
            install.nuget_packages.iter().cloned().collect();
        let mut queue: VecDeque<String> = install.external_modules.iter().cloned().collect();

        while let Some(reference) = queue.pop_front() {
            let dep = match Dep::parse(&reference) {
                Ok(dep) => dep,
                Err(err) => {
                    emit(&Diagnostic::missing_or_unparsable_definition(
                        &reference,
                        err.to_string(),
                    ));
                    continue;
                }
            };

            if !proceeded_modules.insert(dep.name().to_string()) {
                continue;
            }

            let Some(external) = self.external_install(&dep) else {
                continue;
            };

            tracing::debug!(
                "merging install data of `{}` into `{}`",
                reference,
                self.module
            );

            extend_unique(&mut install.install_files, &external.install_files);

            for package in external.nuget_packages {
                if proceeded_packages.insert(package.clone()) {
                    install.nuget_packages.push(package);
                }
            }

            for nested in external.external_modules {
                let processed = Dep::parse(&nested)
                    .map(|d| proceeded_modules.contains(d.name()))
                    .unwrap_or(false);
                if processed {
                    continue;
                }
                if !install.external_modules.contains(&nested) {
                    install.external_modules.push(nested.clone());
                }
                queue.push_back(nested);
            }
        }

        install.module_name = Some(self.module.clone());
        Ok(install)
    }

    /// Own install data of an external module, prefixed with its name.
    fn external_install(&self, dep: &Dep) -> Option<InstallData> {
        let definition = match self.workspace.load_definition(dep.name()) {
            Ok(Some(definition)) => definition,
            Ok(None) => {
                emit(&Diagnostic::missing_or_unparsable_definition(
                    dep.name(),
                    "definition file not found",
                ));
                return None;
            }
            Err(err) => {
                emit(&Diagnostic::missing_or_unparsable_definition(
                    dep.name(),
                    format!("{:#}", err),
                ));
                return None;
            }
        };

        match definition.configuration_or_default(dep.configuration()) {
            Ok(configuration) => Some(
                configuration
                    .install_section
                    .clone()
                    .unwrap_or_default()
                    .with_module_prefix(dep.name()),
            ),
            Err(err) => {
                emit(&Diagnostic::missing_or_unparsable_definition(
                    dep.name(),
                    err.to_string(),
                ));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolveError;
    use crate::test_support::WorkspaceFixture;

    #[test]
    fn test_module_without_definition_installs_nothing() {
        let fixture = WorkspaceFixture::new().module_dir("bare");
        let ws = fixture.workspace();

        let install = InstallCollector::new(&ws, "bare").collect(None).unwrap();
        assert!(install.is_empty());
        assert_eq!(install.module_name.as_deref(), Some("bare"));
    }

    #[test]
    fn test_configuration_without_install_section() {
        let fixture = WorkspaceFixture::new().module("core", "full-build:\n  deps:\n    - x\n");
        let ws = fixture.workspace();

        let install = InstallCollector::new(&ws, "core").collect(None).unwrap();
        assert!(install.artifacts.is_empty());
        assert!(install.install_files.is_empty());
    }

    #[test]
    fn test_paths_are_prefixed_with_module_name() {
        let fixture = WorkspaceFixture::new().module("M", "full-build:\n  install:\n    - out.dll\n");
        let ws = fixture.workspace();

        let install = InstallCollector::new(&ws, "M").collect(Some("")).unwrap();
        assert_eq!(install.artifacts, vec!["M/out.dll"]);
        assert_eq!(install.current_configuration_install_files, vec!["M/out.dll"]);
    }

    #[test]
    fn test_external_modules_are_expanded() {
        let fixture = WorkspaceFixture::new()
            .module(
                "A",
                "full-build:\n  install:\n    - a.dll\n    - module B/client\n    - nuget P1\n",
            )
            .module(
                "B",
                r#"
client:
  install:
    - b.dll
    - module C
    - nuget P2
full-build > client:
  install:
    - b-full.dll
"#,
            )
            .module("C", "full-build:\n  install:\n    - c.dll\n    - nuget P1\n");
        let ws = fixture.workspace();

        let install = InstallCollector::new(&ws, "A").collect(None).unwrap();
        assert_eq!(install.install_files, vec!["A/a.dll", "B/b.dll", "C/c.dll"]);
        assert_eq!(install.artifacts, vec!["A/a.dll"]);
        assert_eq!(install.nuget_packages, vec!["P1", "P2"]);
        assert_eq!(install.external_modules, vec!["B/client", "C"]);
        assert_eq!(install.module_name.as_deref(), Some("A"));
    }

    #[test]
    fn test_cyclic_external_modules_terminate() {
        let fixture = WorkspaceFixture::new()
            .module("A", "full-build:\n  install:\n    - a.dll\n    - module B\n")
            .module("B", "full-build:\n  install:\n    - b.dll\n    - module A\n");
        let ws = fixture.workspace();

        let install = InstallCollector::new(&ws, "A").collect(None).unwrap();
        assert_eq!(install.install_files, vec!["A/a.dll", "B/b.dll"]);
        assert_eq!(install.external_modules, vec!["B"]);
    }

    #[test]
    fn test_missing_external_module_is_skipped() {
        let fixture = WorkspaceFixture::new()
            .module("A", "full-build:\n  install:\n    - a.dll\n    - module Ghost\n    - module B\n")
            .module("B", "full-build:\n  install:\n    - b.dll\n")
            .module("Broken", "full-build: [\n");
        let ws = fixture.workspace();

        let install = InstallCollector::new(&ws, "A").collect(None).unwrap();
        assert_eq!(install.install_files, vec!["A/a.dll", "B/b.dll"]);

        let fixture = WorkspaceFixture::new()
            .module("A", "full-build:\n  install:\n    - module Broken\n    - module B/nope\n")
            .module("B", "full-build:\n")
            .module("Broken", "full-build: [\n");
        let ws = fixture.workspace();

        let install = InstallCollector::new(&ws, "A").collect(None).unwrap();
        assert!(install.install_files.is_empty());
    }

    #[test]
    fn test_unknown_configuration_is_fatal_for_top_module() {
        let fixture = WorkspaceFixture::new().module("core", "full-build:\n");
        let ws = fixture.workspace();

        let err = InstallCollector::new(&ws, "core")
            .collect(Some("client"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::UnknownConfiguration { .. })
        ));
    }

    #[test]
    fn test_collect_is_deterministic() {
        let fixture = WorkspaceFixture::new()
            .module("A", "full-build:\n  install:\n    - a.dll\n    - module B\n    - module C\n")
            .module("B", "full-build:\n  install:\n    - b.dll\n    - module C\n")
            .module("C", "full-build:\n  install:\n    - c.dll\n");
        let ws = fixture.workspace();

        let first = InstallCollector::new(&ws, "A").collect(None).unwrap();
        let second = InstallCollector::new(&ws, "A").collect(None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.install_files, vec!["A/a.dll", "B/b.dll", "C/c.dll"]);
    }
}
