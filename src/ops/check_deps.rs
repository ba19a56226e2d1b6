//! Dependency consistency check.
//!
//! Compares the dependencies a module declares against the references its
//! projects actually make, and reports four findings:
//! - deps that nothing references
//! - references that no dep installs
//! - deps that install nothing
//! - deps whose current-configuration files are never referenced
//!
//! Reference paths are workspace-relative with `\` separators and compared
//! case-insensitively.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::build::BuildTarget;
use crate::core::definition::ModuleConfiguration;
use crate::core::dependency::Dep;
use crate::core::install::InstallData;
use crate::core::workspace::Workspace;
use crate::resolver::{all_install_files, InstallCollector, ResolveError};
use crate::util::diagnostic::{emit, suggestions, Diagnostic};
use crate::util::fs::{file_name, to_backslashes, top_segment};

/// Pseudo-modules provided by the build infrastructure.
const INFRASTRUCTURE_MODULES: [&str; 2] = ["msbuild", "nuget"];

/// Marker of package-restored references inside a module.
const PACKAGES_SEGMENT: &str = "\\packages\\";

/// Source of the references a module's projects declare.
///
/// Project file parsing lives outside this crate; callers plug in an
/// implementation for their build tool.
pub trait ReferenceExtractor {
    /// Project files built by a build target. `solution` is the absolute
    /// path of the target.
    fn projects(&self, solution: &Path, target: &BuildTarget) -> Result<Vec<PathBuf>>;

    /// Reference paths declared by a project for a tool configuration.
    ///
    /// When `all_references` is false only references managed by cement
    /// are expected.
    fn references(
        &self,
        project: &Path,
        configuration: &str,
        all_references: bool,
    ) -> Result<Vec<String>>;
}

/// A reference together with the project declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceWithProject {
    /// Workspace-relative reference path
    pub reference: String,

    /// Project file declaring the reference
    pub project: PathBuf,
}

impl ReferenceWithProject {
    pub fn new(reference: impl Into<String>, project: impl Into<PathBuf>) -> Self {
        ReferenceWithProject {
            reference: reference.into(),
            project: project.into(),
        }
    }
}

/// Result of a dependency check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckDepsResult {
    /// Declared deps no reference points into
    pub not_used_deps: BTreeSet<String>,

    /// References not installed by any declared dep, one per project
    pub not_in_deps: Vec<ReferenceWithProject>,

    /// Declared deps that install nothing
    pub no_yaml_install_section: BTreeSet<String>,

    /// Declared deps whose current-configuration files are never referenced
    pub config_overhead: BTreeSet<String>,
}

impl CheckDepsResult {
    /// Check if there is nothing to report.
    pub fn is_clean(&self) -> bool {
        self.not_used_deps.is_empty()
            && self.not_in_deps.is_empty()
            && self.no_yaml_install_section.is_empty()
            && self.config_overhead.is_empty()
    }

    /// Render the findings as warnings.
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if !self.not_in_deps.is_empty() {
            let mut diagnostic = Diagnostic::warning("references not covered by module deps");
            for r in &self.not_in_deps {
                diagnostic = diagnostic.with_context(format!(
                    "{} (in {})",
                    r.reference,
                    r.project.display()
                ));
            }
            diagnostics.push(diagnostic);
        }

        let named = |message: &str, modules: &BTreeSet<String>| {
            modules.iter().fold(Diagnostic::warning(message), |d, module| {
                d.with_context(module.clone())
            })
        };

        if !self.not_used_deps.is_empty() {
            diagnostics.push(named("deps that are never referenced", &self.not_used_deps));
        }
        if !self.no_yaml_install_section.is_empty() {
            diagnostics.push(
                named(
                    "deps without an install section",
                    &self.no_yaml_install_section,
                )
                .with_suggestion(suggestions::FIX_DEFINITION),
            );
        }
        if !self.config_overhead.is_empty() {
            diagnostics.push(named(
                "deps not used by the current configuration",
                &self.config_overhead,
            ));
        }

        diagnostics
    }
}

/// Checks one module configuration.
pub struct DepsChecker<'a> {
    workspace: &'a Workspace,
    module: String,
    configuration: ModuleConfiguration,
}

impl<'a> DepsChecker<'a> {
    /// Prepare a check; an empty `configuration` selects the module default.
    pub fn new(workspace: &'a Workspace, module: &str, configuration: &str) -> Result<Self> {
        let no_such = |configuration: &str| ResolveError::NoSuchConfiguration {
            module: module.to_string(),
            configuration: configuration.to_string(),
        };

        let Some(definition) = workspace.load_definition(module)? else {
            return Err(no_such(configuration).into());
        };

        let name = match configuration.trim() {
            "" => definition.default_configuration_name()?,
            name => name,
        };
        if !definition.has_configuration(name) {
            return Err(no_such(name).into());
        }

        Ok(DepsChecker {
            workspace,
            module: module.to_string(),
            configuration: definition.configuration(name)?.clone(),
        })
    }

    /// Name of the configuration being checked.
    pub fn configuration_name(&self) -> &str {
        &self.configuration.name
    }

    /// Gather references from every build target of the configured tool and
    /// classify them.
    pub fn check<E>(&self, extractor: &E, all_references: bool) -> Result<CheckDepsResult>
    where
        E: ReferenceExtractor + ?Sized,
    {
        let tool = self.workspace.config().check_tool();
        let module_dir = self.workspace.module_dir(&self.module);

        let mut references = Vec::new();
        for build in &self.configuration.build_section {
            if build.is_placeholder() || build.tool != tool {
                continue;
            }

            let solution = module_dir.join(&build.target);
            for project in extractor.projects(&solution, build)? {
                for reference in
                    extractor.references(&project, &build.configuration, all_references)?
                {
                    references.push(ReferenceWithProject::new(reference, project.clone()));
                }
            }
        }

        tracing::debug!(
            "checking {} references of `{}/{}`",
            references.len(),
            self.module,
            self.configuration.name
        );

        self.check_references(&references)
    }

    /// Like [`DepsChecker::check`], taking `all_references` from the
    /// workspace configuration.
    pub fn check_configured<E>(&self, extractor: &E) -> Result<CheckDepsResult>
    where
        E: ReferenceExtractor + ?Sized,
    {
        self.check(extractor, self.workspace.config().all_references())
    }

    /// Classify references gathered elsewhere.
    ///
    /// References may use `/` or `\` separators; reported references use `\`.
    pub fn check_references(&self, references: &[ReferenceWithProject]) -> Result<CheckDepsResult> {
        let references: Vec<ReferenceWithProject> = references
            .iter()
            .map(|r| ReferenceWithProject::new(to_backslashes(&r.reference), r.project.clone()))
            .collect();

        let mut result = CheckDepsResult::default();
        let found = self.collect_dep_installs(&mut result.no_yaml_install_section);

        let lower_refs: Vec<String> = references
            .iter()
            .map(|r| r.reference.to_lowercase())
            .collect();

        let mut in_deps: HashSet<String> = HashSet::new();
        for install in &found {
            let Some(name) = install.module_name.clone() else {
                continue;
            };

            in_deps.extend(install.artifacts.iter().map(|a| a.to_lowercase()));

            let used = install
                .current_configuration_install_files
                .iter()
                .any(|file| lower_refs.contains(&file.to_lowercase()));

            if used {
                result.not_used_deps.remove(&name);
            } else {
                result.not_used_deps.insert(name.clone());
                result.config_overhead.insert(name);
            }
        }

        for (r, lower) in references.iter().zip(&lower_refs) {
            if !in_deps.contains(lower) && top_segment(&r.reference) != self.module {
                result.not_in_deps.push(r.clone());
            }
        }

        let inner_refs: Vec<&ReferenceWithProject> = references
            .iter()
            .zip(&lower_refs)
            .filter(|(r, lower)| {
                top_segment(&r.reference) == self.module && !lower.contains(PACKAGES_SEGMENT)
            })
            .map(|(r, _)| r)
            .collect();

        if !inner_refs.is_empty() {
            let index = all_install_files(self.workspace)?;
            let installed: HashSet<&str> = index.iter().map(|f| file_name(f)).collect();
            for r in inner_refs {
                if installed.contains(file_name(&r.reference)) {
                    result.not_in_deps.push(r.clone());
                }
            }
        }

        for r in &references {
            result.not_used_deps.remove(top_segment(&r.reference));
        }

        remove_infrastructure(&mut result.not_used_deps);
        remove_infrastructure(&mut result.config_overhead);

        Ok(result)
    }

    /// Install data of every declared dep that installs something.
    ///
    /// Deps installing nothing are added to `no_install` unless they are
    /// content modules.
    fn collect_dep_installs(&self, no_install: &mut BTreeSet<String>) -> Vec<InstallData> {
        let mut found = Vec::new();

        for dep in &self.configuration.dependencies {
            if !self.workspace.module_exists(dep.name()) {
                emit(&Diagnostic::missing_module(dep.name()));
                continue;
            }

            let install = match InstallCollector::new(self.workspace, dep.name())
                .collect(dep.configuration())
            {
                Ok(install) => install,
                Err(err) => {
                    emit(&Diagnostic::missing_or_unparsable_definition(
                        dep.name(),
                        format!("{:#}", err),
                    ));
                    InstallData::default()
                }
            };

            if install.artifacts.is_empty() {
                if !self.workspace.has_definition(dep.name()) || !self.is_content_module(dep) {
                    no_install.insert(dep.name().to_string());
                }
                continue;
            }

            found.push(InstallData {
                module_name: Some(dep.name().to_string()),
                artifacts: install.artifacts.iter().map(|a| to_backslashes(a)).collect(),
                install_files: install.install_files.iter().map(|f| to_backslashes(f)).collect(),
                current_configuration_install_files: install
                    .current_configuration_install_files
                    .iter()
                    .map(|f| to_backslashes(f))
                    .collect(),
                ..install
            });
        }

        found
    }

    /// Check if a dep legitimately installs nothing.
    fn is_content_module(&self, dep: &Dep) -> bool {
        let definition = match self.workspace.load_definition(dep.name()) {
            Ok(Some(definition)) => definition,
            _ => return false,
        };

        if definition.defaults().settings.is_content_module {
            return true;
        }

        match definition.configuration_or_default(dep.configuration()) {
            Ok(configuration) => configuration.builds_nothing(),
            Err(_) => true,
        }
    }
}

fn remove_infrastructure(modules: &mut BTreeSet<String>) {
    modules.retain(|module| {
        !INFRASTRUCTURE_MODULES.iter().any(|infra| {
            module
                .strip_prefix(infra)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '\\']))
        })
    });
}

/// Check a module configuration against references gathered by the caller.
pub fn check_deps(
    ws: &Workspace,
    module: &str,
    configuration: &str,
    references: &[ReferenceWithProject],
) -> Result<CheckDepsResult> {
    DepsChecker::new(ws, module, configuration)?.check_references(references)
}
