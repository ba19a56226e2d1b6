//! User-facing diagnostic messages.
//!
//! Fatal problems travel as [`ResolveError`](crate::resolver::ResolveError)s.
//! Everything recoverable is rendered as a [`Diagnostic`] and handed to the
//! diagnostic sink, which never interrupts resolution.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a configuration is referenced but never declared.
    pub const DECLARE_CONFIGURATION: &str =
        "help: Declare the configuration as a top-level key in module.yaml";

    /// Suggestion when no default configuration can be found.
    pub const MARK_DEFAULT: &str =
        "help: Add `*default` after a configuration name, or add a `full-build` configuration";

    /// Suggestion when a dependency module is absent from the workspace.
    pub const GET_MODULE: &str = "help: Fetch the module into the workspace before checking";

    /// Suggestion when an external module cannot be expanded.
    pub const FIX_DEFINITION: &str = "help: Check that the module has a valid module.yaml";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Error)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Warning)
    }

    /// Create a new note.
    pub fn note(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Note)
    }

    fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// `MissingModuleWarning`: a declared dependency is not on disk.
    pub fn missing_module(module: &str) -> Self {
        Diagnostic::warning(format!("module `{}` not found", module))
            .with_suggestion(suggestions::GET_MODULE)
    }

    /// `MissingOrUnparsableDefinitionWarning`: an external module could not
    /// be expanded during install collection.
    pub fn missing_or_unparsable_definition(module: &str, reason: impl Into<String>) -> Self {
        Diagnostic::warning(format!(
            "skipping external module `{}`: definition is missing or invalid",
            module
        ))
        .with_context(reason)
        .with_suggestion(suggestions::FIX_DEFINITION)
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            for suggestion in &self.suggestions {
                output.push_str(&format!("  {}\n", suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Diagnostic sink for non-fatal conditions.
///
/// Write-only: the diagnostic goes to the `tracing` pipeline of whatever
/// application embeds this crate.
pub fn emit(diagnostic: &Diagnostic) {
    let rendered = diagnostic.format(false);
    match diagnostic.severity {
        Severity::Error => tracing::error!("{}", rendered.trim_end()),
        Severity::Warning => tracing::warn!("{}", rendered.trim_end()),
        Severity::Note => tracing::info!("{}", rendered.trim_end()),
    }
}
