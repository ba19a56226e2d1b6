//! Dependency references.
//!
//! A [`Dep`] names another module and, optionally, the configuration of that
//! module to build against. It never embeds the target module's data; the
//! target's definition is looked up when needed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::resolver::ResolveError;

/// A reference to another module at an optional configuration.
///
/// Canonical form is `module` or `module/configuration`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dep {
    name: String,
    configuration: Option<String>,
}

impl Dep {
    /// Create a dependency on the target module's default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Dep {
            name: name.into(),
            configuration: None,
        }
    }

    /// Pin the dependency to a configuration.
    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = Some(configuration.into());
        self
    }

    /// Parse `module` or `module/configuration`.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let trimmed = raw.trim();
        let (name, configuration) = match trimmed.split_once('/') {
            Some((name, configuration)) => (name.trim(), Some(configuration.trim())),
            None => (trimmed, None),
        };

        if name.is_empty() || configuration.is_some_and(|c| c.is_empty() || c.contains('/')) {
            return Err(ResolveError::InvalidDependency {
                raw: raw.to_string(),
            });
        }

        Ok(Dep {
            name: name.to_string(),
            configuration: configuration.map(str::to_string),
        })
    }

    /// Module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested configuration; `None` means the module's default.
    pub fn configuration(&self) -> Option<&str> {
        self.configuration.as_deref()
    }
}

impl FromStr for Dep {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dep::parse(s)
    }
}

impl TryFrom<String> for Dep {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Dep::parse(&value)
    }
}

impl From<Dep> for String {
    fn from(dep: Dep) -> Self {
        dep.to_string()
    }
}

impl fmt::Display for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(ref configuration) = self.configuration {
            write!(f, "/{}", configuration)?;
        }
        Ok(())
    }
}

/// Append `items` to `target`, skipping anything already present.
pub(crate) fn extend_unique<T: PartialEq + Clone>(target: &mut Vec<T>, items: &[T]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
