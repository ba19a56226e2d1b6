//! Configuration header lines.
//!
//! Every top-level key of a module definition other than `default` is a
//! configuration header:
//!
//! ```text
//! full-build
//! client > sdk
//! full-build *default > client,server
//! ```

use crate::resolver::ResolveError;

/// Marker that makes a configuration the module's explicit default.
pub const DEFAULT_MARKER: &str = "*default";

/// A parsed configuration header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationLine {
    /// Name of the configuration
    pub config_name: String,

    /// Direct parents in source order, without duplicates
    pub parent_names: Vec<String>,

    /// Whether the header carries the `*default` marker
    pub is_default: bool,
}

impl ConfigurationLine {
    /// Create a line with no parents.
    pub fn new(config_name: impl Into<String>) -> Self {
        ConfigurationLine {
            config_name: config_name.into(),
            parent_names: Vec::new(),
            is_default: false,
        }
    }

    /// Add parents.
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for parent in parents {
            let parent = parent.into();
            if !self.parent_names.contains(&parent) {
                self.parent_names.push(parent);
            }
        }
        self
    }

    /// Mark as the explicit default.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Parse a raw header line.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let invalid = |reason: &str| ResolveError::InvalidConfigurationLine {
            line: raw.to_string(),
            reason: reason.to_string(),
        };

        let (head, parents) = match raw.split_once('>') {
            Some((head, parents)) => (head, Some(parents)),
            None => (raw, None),
        };

        let mut is_default = false;
        let mut name = None;
        for token in head.split_whitespace() {
            if token == DEFAULT_MARKER {
                is_default = true;
            } else if name.is_none() {
                name = Some(token);
            } else {
                return Err(invalid("configuration names cannot contain whitespace"));
            }
        }
        let name = name.ok_or_else(|| invalid("missing configuration name"))?;

        let mut line = ConfigurationLine::new(name);
        line.is_default = is_default;

        if let Some(parents) = parents {
            let mut names = Vec::new();
            for parent in parents.split(',') {
                let parent = parent.trim();
                if parent.is_empty() {
                    return Err(invalid("empty parent name"));
                }
                if parent.contains(char::is_whitespace) || parent.contains('>') {
                    return Err(invalid("malformed parent list"));
                }
                names.push(parent);
            }
            line = line.with_parents(names);
        }

        Ok(line)
    }
}
