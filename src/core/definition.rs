//! module.yaml parsing and schema.
//!
//! A module definition maps configuration headers to configuration bodies:
//!
//! ```yaml
//! default:
//!   settings:
//!     type: content
//!   hooks:
//!     - pre-commit.cmd
//!
//! full-build > client:
//!   deps:
//!     - logging
//!     - vostok.core/client
//!   build:
//!     target: Core.sln
//!     configuration: Release
//!   install:
//!     - Core/bin/Release/Core.dll
//!
//! client:
//!   deps:
//!     - logging
//! ```
//!
//! The document is decoded into a generic YAML tree once and immediately
//! turned into typed structures; inheritance is resolved while parsing, so a
//! [`ModuleDefinition`] is never mutated afterwards.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_yaml::{Mapping, Value};

use crate::core::build::{parse_build_section, BuildTarget};
use crate::core::configuration::ConfigurationLine;
use crate::core::dependency::{extend_unique, Dep};
use crate::core::hierarchy::ConfigurationHierarchy;
use crate::core::install::{InstallData, InstallSection};
use crate::resolver::ResolveError;
use crate::util::fs::read_to_string;

/// Reserved top-level key holding module-wide defaults.
pub const DEFAULT_SECTION: &str = "default";

const CONTENT_MODULE_TYPE: &str = "content";

/// Module-wide settings from `default.settings`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// The module only ships content and produces no build output
    pub is_content_module: bool,
}

/// The reserved `default` section.
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    /// Module settings
    pub settings: Settings,

    /// Lifecycle hooks, in declaration order
    pub hooks: Vec<String>,

    /// Dependencies shared by every configuration
    pub deps: Vec<Dep>,

    /// Build targets for configurations without their own `build`
    pub build: Option<Vec<BuildTarget>>,

    /// Install directives shared by every configuration
    pub install: Option<InstallSection>,
}

/// A fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct ModuleConfiguration {
    /// Configuration name
    pub name: String,

    /// Own dependencies followed by inherited ones, without duplicates
    pub dependencies: Vec<Dep>,

    /// Build steps
    pub build_section: Vec<BuildTarget>,

    /// Install data, absent when nothing in the inheritance chain declares any
    pub install_section: Option<InstallData>,
}

impl ModuleConfiguration {
    /// Check if every build step is the `None` placeholder.
    pub fn builds_nothing(&self) -> bool {
        self.build_section.iter().all(BuildTarget::is_placeholder)
    }
}

/// Sections declared directly in one configuration body.
#[derive(Debug, Default)]
struct RawConfiguration {
    deps: Vec<Dep>,
    build: Option<Vec<BuildTarget>>,
    install: Option<InstallSection>,
}

/// The parsed module.yaml of one module.
#[derive(Debug, Clone, Default)]
pub struct ModuleDefinition {
    /// Owning module, when known
    module_name: Option<String>,

    /// Resolved configurations by name
    configurations: HashMap<String, ModuleConfiguration>,

    /// Inheritance DAG
    hierarchy: ConfigurationHierarchy,

    /// The `default` section
    defaults: Defaults,
}

impl ModuleDefinition {
    /// Load a definition from a file; the module name is the parent directory name.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_to_string(path).context("failed to read module definition")?;

        let module_name = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::parse_module(&module_name, &content)
            .with_context(|| format!("invalid module definition: {}", path.display()))
    }

    /// Parse definition text that does not belong to a known module.
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_module("", content)
    }

    /// Parse definition text owned by `module_name`.
    pub fn parse_module(module_name: &str, content: &str) -> Result<Self> {
        let document: Value =
            serde_yaml::from_str(content).context("failed to parse module definition")?;

        let root = match document {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            _ => bail!("module definition must be a mapping of configurations"),
        };

        let in_module = |err: ResolveError| err.in_module(module_name);

        let mut defaults = Defaults::default();
        let mut lines = Vec::new();
        let mut bodies = HashMap::new();

        for (key, body) in &root {
            let Some(key) = key.as_str() else {
                bail!("configuration headers must be strings, found {:?}", key);
            };

            if key.trim() == DEFAULT_SECTION {
                defaults = parse_defaults(body).map_err(in_module)?;
                continue;
            }

            let line = ConfigurationLine::parse(key).map_err(in_module)?;
            bodies.insert(line.config_name.clone(), body);
            lines.push(line);
        }

        let hierarchy = ConfigurationHierarchy::build(&lines).map_err(in_module)?;

        let mut raw = HashMap::new();
        for (name, body) in &bodies {
            raw.insert(name.as_str(), parse_body(name, body).map_err(in_module)?);
        }

        let mut configurations: HashMap<String, ModuleConfiguration> = HashMap::new();
        for name in hierarchy.topological_order() {
            let Some(own) = raw.get(name) else {
                // Referenced only as a parent; children needing it fail below.
                continue;
            };

            let mut dependencies = Vec::new();
            extend_unique(&mut dependencies, &own.deps);
            for parent in hierarchy.closest_parents(name).map_err(in_module)? {
                let parent = configurations.get(parent).ok_or_else(|| {
                    ResolveError::UnknownConfiguration {
                        module: module_name.to_string(),
                        configuration: parent.clone(),
                    }
                })?;
                extend_unique(&mut dependencies, &parent.dependencies);
            }
            extend_unique(&mut dependencies, &defaults.deps);

            let build_section = own
                .build
                .clone()
                .or_else(|| defaults.build.clone())
                .unwrap_or_default();

            let mut inherited: Vec<&InstallSection> = Vec::new();
            for ancestor in hierarchy.ancestors(name).map_err(in_module)? {
                if let Some(section) = raw.get(ancestor).and_then(|r| r.install.as_ref()) {
                    inherited.push(section);
                }
            }
            inherited.extend(defaults.install.as_ref());

            let install_section = if own.install.is_none() && inherited.is_empty() {
                None
            } else {
                Some(InstallData::from_sections(own.install.as_ref(), inherited))
            };

            tracing::debug!(
                "resolved configuration `{}` with {} deps",
                name,
                dependencies.len()
            );

            configurations.insert(
                name.to_string(),
                ModuleConfiguration {
                    name: name.to_string(),
                    dependencies,
                    build_section,
                    install_section,
                },
            );
        }

        Ok(ModuleDefinition {
            module_name: (!module_name.is_empty()).then(|| module_name.to_string()),
            configurations,
            hierarchy,
            defaults,
        })
    }

    /// Owning module name, if known.
    pub fn module_name(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    fn module_label(&self) -> String {
        self.module_name.clone().unwrap_or_default()
    }

    /// The configuration hierarchy.
    pub fn hierarchy(&self) -> &ConfigurationHierarchy {
        &self.hierarchy
    }

    /// The `default` section.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Names of all configurations, in order of first appearance.
    pub fn configuration_names(&self) -> Vec<&str> {
        self.hierarchy
            .all_configurations()
            .into_iter()
            .filter(|name| self.configurations.contains_key(*name))
            .collect()
    }

    /// All configurations, in order of first appearance.
    pub fn configurations(&self) -> impl Iterator<Item = &ModuleConfiguration> {
        self.hierarchy
            .all_configurations()
            .into_iter()
            .filter_map(|name| self.configurations.get(name))
    }

    /// Check if a configuration is declared.
    pub fn has_configuration(&self, name: &str) -> bool {
        self.configurations.contains_key(name)
    }

    /// Look up a declared configuration.
    pub fn configuration(&self, name: &str) -> Result<&ModuleConfiguration, ResolveError> {
        self.configurations
            .get(name)
            .ok_or_else(|| ResolveError::UnknownConfiguration {
                module: self.module_label(),
                configuration: name.to_string(),
            })
    }

    /// Name of the default configuration.
    pub fn default_configuration_name(&self) -> Result<&str, ResolveError> {
        self.hierarchy
            .default_configuration()
            .map_err(|err| err.in_module(&self.module_label()))
    }

    /// Look up a configuration, falling back to the default when `name` is
    /// absent or empty.
    pub fn configuration_or_default(
        &self,
        name: Option<&str>,
    ) -> Result<&ModuleConfiguration, ResolveError> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => self.configuration(name),
            None => self.configuration(self.default_configuration_name()?),
        }
    }

    /// Build targets of every configuration.
    pub fn build_targets(&self) -> impl Iterator<Item = &BuildTarget> {
        self.configurations().flat_map(|c| c.build_section.iter())
    }
}

/// Build an `InvalidSection` error.
pub(crate) fn invalid_section(
    configuration: &str,
    section: &str,
    reason: impl Into<String>,
) -> ResolveError {
    ResolveError::InvalidSection {
        configuration: configuration.to_string(),
        section: section.to_string(),
        reason: reason.into(),
    }
}

/// Read a section holding a string or a sequence of strings.
pub(crate) fn string_list(
    configuration: &str,
    section: &str,
    value: &Value,
) -> Result<Vec<String>, ResolveError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.trim().to_string()]),
        Value::Sequence(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| invalid_section(configuration, section, "expected strings"))
            })
            .collect(),
        _ => Err(invalid_section(
            configuration,
            section,
            "expected a string or a sequence of strings",
        )),
    }
}

fn body_mapping<'a>(configuration: &str, body: &'a Value) -> Result<Option<&'a Mapping>, ResolveError> {
    match body {
        Value::Null => Ok(None),
        Value::Mapping(mapping) => Ok(Some(mapping)),
        _ => Err(invalid_section(
            configuration,
            "body",
            "configuration body must be a mapping",
        )),
    }
}

fn parse_deps(configuration: &str, value: &Value) -> Result<Vec<Dep>, ResolveError> {
    let mut deps = Vec::new();
    for raw in string_list(configuration, "deps", value)? {
        let dep = Dep::parse(&raw)?;
        if !deps.contains(&dep) {
            deps.push(dep);
        }
    }
    Ok(deps)
}

fn parse_body(configuration: &str, body: &Value) -> Result<RawConfiguration, ResolveError> {
    let Some(mapping) = body_mapping(configuration, body)? else {
        return Ok(RawConfiguration::default());
    };

    let deps = match mapping.get("deps") {
        Some(value) => parse_deps(configuration, value)?,
        None => Vec::new(),
    };

    let build = mapping
        .get("build")
        .map(|value| parse_build_section(configuration, value))
        .transpose()?;

    let install = InstallSection::parse(
        configuration,
        mapping.get("install"),
        mapping.get("artifacts").or_else(|| mapping.get("artefacts")),
    )?;

    for key in ignored_sections(configuration, mapping) {
        tracing::debug!("configuration `{}`: ignoring section `{}`", configuration, key);
    }

    Ok(RawConfiguration {
        deps,
        build,
        install,
    })
}

/// Keys of a configuration body that nothing reads.
fn ignored_sections<'a>(configuration: &str, mapping: &'a Mapping) -> Vec<&'a str> {
    const SECTIONS: [&str; 5] = ["deps", "build", "install", "artifacts", "artefacts"];
    const DEFAULT_ONLY: [&str; 2] = ["hooks", "settings"];

    mapping
        .keys()
        .filter_map(Value::as_str)
        .filter(|key| {
            !SECTIONS.contains(key)
                && !(configuration == DEFAULT_SECTION && DEFAULT_ONLY.contains(key))
        })
        .collect()
}

fn parse_defaults(body: &Value) -> Result<Defaults, ResolveError> {
    let raw = parse_body(DEFAULT_SECTION, body)?;
    let mut defaults = Defaults {
        deps: raw.deps,
        build: raw.build,
        install: raw.install,
        ..Defaults::default()
    };

    let Some(mapping) = body_mapping(DEFAULT_SECTION, body)? else {
        return Ok(defaults);
    };

    if let Some(hooks) = mapping.get("hooks") {
        defaults.hooks = string_list(DEFAULT_SECTION, "hooks", hooks)?;
    }

    match mapping.get("settings") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(settings)) => {
            defaults.settings.is_content_module = settings
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.trim() == CONTENT_MODULE_TYPE);
        }
        Some(_) => {
            return Err(invalid_section(
                DEFAULT_SECTION,
                "settings",
                "expected a mapping",
            ))
        }
    }

    Ok(defaults)
}
