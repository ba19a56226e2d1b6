//! Install section of a configuration.
//!
//! ```yaml
//! full-build:
//!   install:
//!     - bin/Release/Core.dll
//!     - module logging/client
//!     - nuget Newtonsoft.Json/12.0.1
//!   artifacts:
//!     - bin/Release/Core.pdb
//! ```
//!
//! Plain entries are install files. `module` entries reference external
//! modules whose own install data is merged in transitively; `nuget` entries
//! are opaque package identifiers.

use serde::Serialize;
use serde_yaml::Value;

use crate::core::definition::string_list;
use crate::core::dependency::{extend_unique, Dep};
use crate::resolver::ResolveError;

const MODULE_PREFIX: &str = "module";
const NUGET_PREFIX: &str = "nuget";

/// Install directives declared directly in one section, before inheritance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSection {
    pub install_files: Vec<String>,
    pub artifacts: Vec<String>,
    pub external_modules: Vec<String>,
    pub nuget_packages: Vec<String>,
}

impl InstallSection {
    /// Parse the `install` and `artifacts` sections of one configuration.
    ///
    /// Returns `None` when neither section is present.
    pub fn parse(
        configuration: &str,
        install: Option<&Value>,
        artifacts: Option<&Value>,
    ) -> Result<Option<Self>, ResolveError> {
        if install.is_none() && artifacts.is_none() {
            return Ok(None);
        }

        let mut section = InstallSection::default();

        if let Some(install) = install {
            for entry in string_list(configuration, "install", install)? {
                match entry.split_once(char::is_whitespace) {
                    Some((MODULE_PREFIX, reference)) => {
                        let reference = reference.trim();
                        Dep::parse(reference)?;
                        push_unique(&mut section.external_modules, reference);
                    }
                    Some((NUGET_PREFIX, package)) => {
                        push_unique(&mut section.nuget_packages, package.trim());
                    }
                    _ => push_unique(&mut section.install_files, &entry),
                }
            }
        }

        if let Some(artifacts) = artifacts {
            for artifact in string_list(configuration, "artifacts", artifacts)? {
                push_unique(&mut section.artifacts, &artifact);
            }
        }

        Ok(Some(section))
    }
}

fn push_unique(items: &mut Vec<String>, item: &str) {
    if !items.iter().any(|existing| existing == item) {
        items.push(item.to_string());
    }
}

/// Install data of a module configuration.
///
/// Path-valued fields are module-relative as parsed and become
/// workspace-relative after [`InstallData::with_module_prefix`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallData {
    /// Owning module, assigned once the data is resolved
    pub module_name: Option<String>,

    /// Produced output paths (install files followed by extra artifacts)
    pub artifacts: Vec<String>,

    /// Files placed into a consumer's environment
    pub install_files: Vec<String>,

    /// Install files declared by the active configuration itself
    pub current_configuration_install_files: Vec<String>,

    /// `name[/configuration]` references expanded transitively
    pub external_modules: Vec<String>,

    /// Package identifiers propagated to consumers
    pub nuget_packages: Vec<String>,
}

impl InstallData {
    /// Combine a configuration's own section with its inherited sections.
    ///
    /// `inherited` must already be in inheritance order: ancestors
    /// breadth-first, then the module's `default` section.
    pub fn from_sections<'a>(
        own: Option<&'a InstallSection>,
        inherited: impl IntoIterator<Item = &'a InstallSection>,
    ) -> Self {
        let mut data = InstallData::default();
        let mut extra_artifacts = Vec::new();

        if let Some(own) = own {
            data.current_configuration_install_files = own.install_files.clone();
        }

        for section in own.into_iter().chain(inherited) {
            extend_unique(&mut data.install_files, &section.install_files);
            extend_unique(&mut extra_artifacts, &section.artifacts);
            extend_unique(&mut data.external_modules, &section.external_modules);
            extend_unique(&mut data.nuget_packages, &section.nuget_packages);
        }

        data.artifacts = data.install_files.clone();
        extend_unique(&mut data.artifacts, &extra_artifacts);
        data
    }

    /// Rewrite module-relative paths as `module/path`.
    pub fn with_module_prefix(mut self, module: &str) -> Self {
        let prefix = |paths: &mut Vec<String>| {
            for path in paths.iter_mut() {
                *path = format!("{}/{}", module, path);
            }
        };
        prefix(&mut self.install_files);
        prefix(&mut self.artifacts);
        prefix(&mut self.current_configuration_install_files);
        self
    }

    /// Check if nothing would be installed.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
            && self.install_files.is_empty()
            && self.external_modules.is_empty()
            && self.nuget_packages.is_empty()
    }
}
