//! Resolution error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::job::JobKey;
use crate::core::platform::{Arch, PlatformFamily, TargetOs};
use crate::util::diagnostic::Diagnostic;

/// The five classes of resolution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed descriptor shape
    Schema,
    /// Ambiguous or empty architecture expansion
    Matrix,
    /// An override changes the type of the value it overrides
    MergeTypeConflict,
    /// Two jobs resolve to the same output location
    DuplicateJob,
    /// A library override names an undeclared library
    UnknownReference,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Schema => "schema error",
            ErrorKind::Matrix => "matrix error",
            ErrorKind::MergeTypeConflict => "merge type conflict",
            ErrorKind::DuplicateJob => "duplicate job",
            ErrorKind::UnknownReference => "unknown reference",
        };
        f.write_str(name)
    }
}

/// Error during descriptor resolution.
///
/// Every variant carries the field path of the offending fragment. Any error
/// aborts the whole run; no partial job list is ever produced.
#[derive(Debug, Clone, PartialEq, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error("{}", at_path(.path, .message))]
    #[diagnostic(code(xbuild::resolve::schema))]
    Schema { path: String, message: String },

    #[error("unknown platform `{key}` at `{path}`")]
    #[diagnostic(
        code(xbuild::resolve::unknown_platform),
        help("known platforms are: win32, linux, darwin")
    )]
    UnknownPlatform { key: String, path: String },

    #[error("unknown target OS `{key}` at `{path}`")]
    #[diagnostic(
        code(xbuild::resolve::unknown_os),
        help("known target OSes are: windows, android, linux, macos, ios")
    )]
    UnknownTargetOs { key: String, path: String },

    #[error("empty architecture list for {platform}/{os} at `{path}`")]
    #[diagnostic(
        code(xbuild::resolve::empty_archs),
        help("list at least one architecture, or remove `archs` to use the default")
    )]
    EmptyArchs {
        platform: PlatformFamily,
        os: TargetOs,
        path: String,
    },

    #[error("platform `{platform}` at `{path}` declares no target OS")]
    #[diagnostic(
        code(xbuild::resolve::no_targets),
        help("add a target OS table under the platform, or remove the platform")
    )]
    NoTargets { platform: PlatformFamily, path: String },

    #[error("type conflict at `{path}`: cannot override {expected} with {found}")]
    #[diagnostic(
        code(xbuild::resolve::type_conflict),
        help("an override must keep the type of the value it replaces")
    )]
    MergeTypeConflict {
        path: String,
        expected: String,
        found: String,
    },

    #[error("jobs `{first}` and `{second}` both write {os}/{arch} into `{build_out_dir}`")]
    #[diagnostic(
        code(xbuild::resolve::duplicate_job),
        help("give one of the targets a different `buildOutDir`, or use the `{{platform}}` placeholder")
    )]
    DuplicateJob {
        os: TargetOs,
        arch: Arch,
        build_out_dir: String,
        first: JobKey,
        second: JobKey,
    },

    #[error("library `{library}` at `{path}` is not declared in `common.libraries`")]
    #[diagnostic(
        code(xbuild::resolve::unknown_library),
        help("declare the library under `common.libraries` before overriding it")
    )]
    UnknownLibrary { library: String, path: String },
}

fn at_path(path: &str, message: &str) -> String {
    if path.is_empty() {
        message.to_string()
    } else {
        format!("invalid value at `{}`: {}", path, message)
    }
}

impl ResolveError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::Schema { .. }
            | ResolveError::UnknownPlatform { .. }
            | ResolveError::UnknownTargetOs { .. } => ErrorKind::Schema,
            ResolveError::EmptyArchs { .. } | ResolveError::NoTargets { .. } => ErrorKind::Matrix,
            ResolveError::MergeTypeConflict { .. } => ErrorKind::MergeTypeConflict,
            ResolveError::DuplicateJob { .. } => ErrorKind::DuplicateJob,
            ResolveError::UnknownLibrary { .. } => ErrorKind::UnknownReference,
        }
    }

    /// Field path of the offending descriptor fragment.
    pub fn path(&self) -> &str {
        match self {
            ResolveError::Schema { path, .. }
            | ResolveError::UnknownPlatform { path, .. }
            | ResolveError::UnknownTargetOs { path, .. }
            | ResolveError::EmptyArchs { path, .. }
            | ResolveError::NoTargets { path, .. }
            | ResolveError::MergeTypeConflict { path, .. }
            | ResolveError::UnknownLibrary { path, .. } => path,
            ResolveError::DuplicateJob { build_out_dir, .. } => build_out_dir,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string()).with_context(format!("kind: {}", self.kind()));

        match self {
            ResolveError::Schema { .. } => diag.with_suggestion(
                "Check the field against the descriptor format: `xbuild init` writes a complete example",
            ),

            ResolveError::UnknownPlatform { key, .. } => diag
                .with_context(format!(
                    "known platforms: {}",
                    PlatformFamily::known_keys()
                ))
                .with_suggestion(format!("Rename `{}` to one of the known platforms", key)),

            ResolveError::UnknownTargetOs { key, .. } => diag
                .with_context(format!("known target OSes: {}", TargetOs::known_keys()))
                .with_suggestion(format!("Rename `{}` to one of the known target OSes", key)),

            ResolveError::EmptyArchs { os, .. } => diag
                .with_suggestion("List the architectures to build, e.g. `archs = [\"x64\"]`")
                .with_suggestion(format!(
                    "Remove `archs` to build the default architecture ({})",
                    os.default_arch()
                )),

            ResolveError::NoTargets { platform, .. } => diag
                .with_context(format!("known target OSes: {}", TargetOs::known_keys()))
                .with_suggestion(format!("Add at least one `[platforms.{}.<os>]` table", platform)),

            ResolveError::MergeTypeConflict {
                expected, found, ..
            } => diag
                .with_context(format!("baseline value is a {}, override is a {}", expected, found))
                .with_suggestion("Change the override to the same type as the common value"),

            ResolveError::DuplicateJob {
                first,
                second,
                ..
            } => diag
                .with_context(format!("first declared by {}", first))
                .with_context(format!("redeclared by {}", second))
                .with_suggestion(format!(
                    "Set a distinct `buildOutDir` under `platforms.{}.{}`",
                    second.platform, second.os
                ))
                .with_suggestion("Use `{platform}` in `buildOutDir` to separate families"),

            ResolveError::UnknownLibrary { library, .. } => diag.with_suggestion(format!(
                "Add `[common.libraries.{}]` or fix the library name",
                library
            )),
        }
    }
}
