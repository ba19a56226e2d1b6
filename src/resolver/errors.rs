//! Resolution error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error raised while parsing or resolving module configurations.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error("cycle detected in configuration hierarchy: {}", configurations.join(" -> "))]
    #[diagnostic(code(cement::config::cycle))]
    Cycle { configurations: Vec<String> },

    #[error("configuration `{configuration}` is not declared in module `{module}`")]
    #[diagnostic(code(cement::config::unknown))]
    UnknownConfiguration {
        module: String,
        configuration: String,
    },

    #[error("module `{module}` has no default configuration")]
    #[diagnostic(
        code(cement::config::no_default),
        help("mark a configuration with `*default` or name one `full-build`")
    )]
    NoDefaultConfiguration { module: String },

    #[error("no configuration `{configuration}` in module `{module}`")]
    #[diagnostic(code(cement::check::no_such_configuration))]
    NoSuchConfiguration {
        module: String,
        configuration: String,
    },

    #[error("configuration `{configuration}` is declared more than once")]
    #[diagnostic(code(cement::config::duplicate))]
    DuplicateConfiguration { configuration: String },

    #[error("invalid configuration line `{line}`: {reason}")]
    #[diagnostic(code(cement::config::invalid_line))]
    InvalidConfigurationLine { line: String, reason: String },

    #[error("invalid `{section}` section in configuration `{configuration}`: {reason}")]
    #[diagnostic(code(cement::definition::invalid_section))]
    InvalidSection {
        configuration: String,
        section: String,
        reason: String,
    },

    #[error("invalid dependency reference `{raw}`")]
    #[diagnostic(code(cement::definition::invalid_dep))]
    InvalidDependency { raw: String },
}

impl ResolveError {
    /// Attach the owning module name to errors raised before it was known.
    pub fn in_module(self, module_name: &str) -> Self {
        match self {
            ResolveError::UnknownConfiguration {
                module,
                configuration,
            } if module.is_empty() => ResolveError::UnknownConfiguration {
                module: module_name.to_string(),
                configuration,
            },
            ResolveError::NoDefaultConfiguration { module } if module.is_empty() => {
                ResolveError::NoDefaultConfiguration {
                    module: module_name.to_string(),
                }
            }
            other => other,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::Cycle { configurations } => {
                Diagnostic::error("cycle detected in configuration hierarchy")
                    .with_context(format!("cycle: {}", configurations.join(" -> ")))
                    .with_suggestion("Remove one of the `>` parent references forming the cycle")
            }

            ResolveError::UnknownConfiguration {
                module,
                configuration,
            } => Diagnostic::error(format!(
                "configuration `{}` is not declared in module `{}`",
                configuration, module
            ))
            .with_suggestion(suggestions::DECLARE_CONFIGURATION),

            ResolveError::NoDefaultConfiguration { module } => {
                Diagnostic::error(format!("module `{}` has no default configuration", module))
                    .with_suggestion(suggestions::MARK_DEFAULT)
            }

            ResolveError::NoSuchConfiguration {
                module,
                configuration,
            } => Diagnostic::error(format!(
                "no configuration `{}` in module `{}`",
                configuration, module
            ))
            .with_suggestion(suggestions::DECLARE_CONFIGURATION),

            ResolveError::DuplicateConfiguration { configuration } => Diagnostic::error(format!(
                "configuration `{}` is declared more than once",
                configuration
            ))
            .with_suggestion("Merge the duplicated configuration blocks"),

            ResolveError::InvalidConfigurationLine { line, reason } => {
                Diagnostic::error(format!("invalid configuration line `{}`", line))
                    .with_context(reason.clone())
            }

            ResolveError::InvalidSection {
                configuration,
                section,
                reason,
            } => Diagnostic::error(format!(
                "invalid `{}` section in configuration `{}`",
                section, configuration
            ))
            .with_context(reason.clone()),

            ResolveError::InvalidDependency { raw } => {
                Diagnostic::error(format!("invalid dependency reference `{}`", raw))
                    .with_suggestion("Use `module` or `module/configuration`")
            }
        }
    }
}
