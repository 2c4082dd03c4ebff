//! Terminal diagnostics.
//!
//! A diagnostic is a headline plus the facts needed to act on it: where the
//! problem is, what was found, and what to change.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

/// Hints shared by error paths outside the resolver.
pub mod suggestions {
    /// Suggestion when no descriptor file is found.
    pub const NO_DESCRIPTOR: &str = "help: Run `xbuild init` to create a build descriptor";

    /// Suggestion when cmake cannot be located.
    pub const NO_CMAKE: &str =
        "help: Install CMake or set `program` under `[cmake]` in .xbuild/config.toml";

    /// Suggestion when an Android job has no NDK.
    pub const NO_NDK: &str =
        "help: Set ANDROID_NDK_ROOT or `ndk` under `[android]` in .xbuild/config.toml";

    /// Suggestion when a build job fails.
    pub const BUILD_FAILED: &str = "help: Run `xbuild build --verbose` for more details";

    /// Suggestion when filters match no job.
    pub const NO_MATCHING_JOBS: &str = "help: Run `xbuild plan` to list the available jobs";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self, color: bool) -> &'static str {
        match (self, color) {
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Error, false) => "error",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
            (Severity::Warning, false) => "warning",
        }
    }
}

/// A message with location, context lines and suggested fixes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
    /// File the diagnostic refers to
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for a terminal, with ANSI colors when `color` is set.
    pub fn format(&self, color: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", self.severity.label(color), self.message);

        if let Some(path) = &self.location {
            let _ = writeln!(out, "  --> {}", path.display());
        }
        for line in &self.context {
            let _ = writeln!(out, "  → {}", line);
        }

        match self.suggestions.as_slice() {
            [] => {}
            [only] => {
                let _ = writeln!(out, "\n{}: {}", help_label(color), only);
            }
            many => {
                let _ = writeln!(out, "\n{}: consider:", help_label(color));
                for (i, suggestion) in many.iter().enumerate() {
                    let _ = writeln!(out, "  {}. {}", i + 1, suggestion);
                }
            }
        }

        out
    }
}

fn help_label(color: bool) -> &'static str {
    if color {
        "\x1b[1;32mhelp\x1b[0m"
    } else {
        "help"
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("empty architecture list for win32/android")
            .with_location("/src/demo/xbuild.toml")
            .with_context("kind: matrix error")
            .with_suggestion("List the architectures to build")
            .with_suggestion("Remove `archs` to build the default architecture");

        let output = diag.format(false);
        assert!(output.starts_with("error: empty architecture list"));
        assert!(output.contains("--> /src/demo/xbuild.toml"));
        assert!(output.contains("→ kind: matrix error"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("2. Remove `archs`"));
    }

    #[test]
    fn test_single_suggestion_is_inline() {
        let output = Diagnostic::error("library `core` is not declared")
            .with_suggestion("Add `[common.libraries.core]`")
            .format(false);
        assert!(output.ends_with("\nhelp: Add `[common.libraries.core]`\n"));
    }

    #[test]
    fn test_warning_without_extras() {
        let output = Diagnostic::warning("platform `darwin` declares no target OS").format(false);
        assert_eq!(output, "warning: platform `darwin` declares no target OS\n");
    }

    #[test]
    fn test_color_labels() {
        let output = Diagnostic::error("boom").format(true);
        assert!(output.contains("\x1b[1;31merror"));
    }
}
