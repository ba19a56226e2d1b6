//! Build section of a configuration.
//!
//! ```yaml
//! full-build:
//!   build:
//!     target: Solution.sln
//!     configuration: Release
//!     tool: msbuild
//! ```
//!
//! The section may also be a sequence of such mappings.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::core::definition::invalid_section;
use crate::resolver::ResolveError;

/// Target value of a configuration that builds nothing.
pub const NONE_TARGET: &str = "None";

/// Tool used when a build entry does not name one.
pub const DEFAULT_TOOL: &str = "msbuild";

/// Build configuration passed to the tool when none is given.
pub const DEFAULT_BUILD_CONFIGURATION: &str = "Release";

/// One build step of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
    /// Module-relative path to a solution/project file, or `None`
    pub target: String,

    /// Build tool name
    pub tool: String,

    /// Configuration passed to the tool
    pub configuration: String,
}

impl BuildTarget {
    /// Create a build target with the default tool and configuration.
    pub fn new(target: impl Into<String>) -> Self {
        BuildTarget {
            target: target.into(),
            tool: DEFAULT_TOOL.to_string(),
            configuration: DEFAULT_BUILD_CONFIGURATION.to_string(),
        }
    }

    /// Set the tool.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Set the tool configuration.
    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }

    /// Check if this is the no-op placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.target == NONE_TARGET
    }

    /// Check if the target is a solution file.
    pub fn is_solution(&self) -> bool {
        !self.is_placeholder() && self.target.to_ascii_lowercase().ends_with(".sln")
    }
}

/// Parse a `build` section.
pub fn parse_build_section(
    configuration: &str,
    value: &Value,
) -> Result<Vec<BuildTarget>, ResolveError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Mapping(mapping) => Ok(vec![parse_build_entry(configuration, mapping)?]),
        Value::Sequence(entries) => entries
            .iter()
            .map(|entry| match entry {
                Value::Mapping(mapping) => parse_build_entry(configuration, mapping),
                _ => Err(invalid_section(
                    configuration,
                    "build",
                    "each build entry must be a mapping",
                )),
            })
            .collect(),
        _ => Err(invalid_section(
            configuration,
            "build",
            "expected a mapping or a sequence of mappings",
        )),
    }
}

fn parse_build_entry(configuration: &str, mapping: &Mapping) -> Result<BuildTarget, ResolveError> {
    let field = |key: &str| -> Result<Option<String>, ResolveError> {
        match mapping.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(_) => Err(invalid_section(
                configuration,
                "build",
                format!("`{}` must be a string", key),
            )),
        }
    };

    let target = field("target")?
        .filter(|t| !t.is_empty())
        .ok_or_else(|| invalid_section(configuration, "build", "missing `target`"))?;

    let tool = match mapping.get("tool") {
        None | Some(Value::Null) => DEFAULT_TOOL.to_string(),
        Some(Value::String(name)) => name.trim().to_string(),
        Some(Value::Mapping(tool)) => match tool.get("name") {
            Some(Value::String(name)) => name.trim().to_string(),
            _ => {
                return Err(invalid_section(
                    configuration,
                    "build",
                    "`tool.name` must be a string",
                ))
            }
        },
        Some(_) => {
            return Err(invalid_section(
                configuration,
                "build",
                "`tool` must be a string or a mapping",
            ))
        }
    };

    let tool_configuration =
        field("configuration")?.unwrap_or_else(|| DEFAULT_BUILD_CONFIGURATION.to_string());

    Ok(BuildTarget::new(target)
        .with_tool(tool)
        .with_configuration(tool_configuration))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<Vec<BuildTarget>, ResolveError> {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        parse_build_section("full-build", &value)
    }

    #[test]
    fn test_single_build_entry() {
        let targets = parse("target: Solution.sln\nconfiguration: Debug\n").unwrap();
        assert_eq!(
            targets,
            vec![BuildTarget::new("Solution.sln").with_configuration("Debug")]
        );
        assert!(targets[0].is_solution());
    }

    #[test]
    fn test_multiple_build_entries_with_tool_mapping() {
        let targets = parse(
            r#"
- target: a.sln
  tool:
    name: dotnet
- target: None
"#,
        )
        .unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].tool, "dotnet");
        assert_eq!(targets[0].configuration, DEFAULT_BUILD_CONFIGURATION);
        assert!(targets[1].is_placeholder());
        assert!(!targets[1].is_solution());
    }

    #[test]
    fn test_missing_target_is_an_error() {
        assert!(matches!(
            parse("configuration: Release\n"),
            Err(ResolveError::InvalidSection { .. })
        ));
        assert!(parse("- just-a-string\n").is_err());
    }
}
