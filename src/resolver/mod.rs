//! Descriptor resolution.
//!
//! Turns a [`BuildDescriptor`] into an ordered list of [`ResolvedJob`]s:
//! matrix expansion, then layer merging, then validation. The resolver is
//! pure and deterministic - all I/O happens before and after resolution.

pub mod errors;
pub mod matrix;
pub mod merge;
pub mod validate;

pub use errors::{ErrorKind, ResolveError};
pub use validate::{ValidationState, Validator};

use crate::core::descriptor::BuildDescriptor;
use crate::core::job::ResolvedJob;

/// Resolve a descriptor into build jobs.
///
/// Jobs come out in declaration order: families, then target OSes, then
/// architectures. Any error rejects the whole run.
pub fn resolve(descriptor: &BuildDescriptor) -> Result<Vec<ResolvedJob>, ResolveError> {
    let units = matrix::expand(descriptor)?;

    let jobs = units
        .iter()
        .map(|unit| merge::resolve_job(descriptor, unit))
        .collect::<Result<Vec<_>, _>>()?;

    let mut validator = Validator::new(descriptor);
    validator.validate(&jobs)?;

    tracing::debug!(
        "resolved {} job(s) for `{}` across {} target(s)",
        jobs.len(),
        descriptor.project,
        descriptor.target_count()
    );
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{Arch, TargetOs};
    use crate::core::value::ConfigValue;
    use crate::test_support::{NO_DEFAULT_ARCH_TOML, TINYCTHREAD_TOML};

    #[test]
    fn test_job_count_is_sum_of_archs() {
        let desc = BuildDescriptor::parse_toml(TINYCTHREAD_TOML).unwrap();
        let jobs = resolve(&desc).unwrap();
        // windows 1 + android 4 + linux 1 + macos 1
        assert_eq!(jobs.len(), 7);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let desc = BuildDescriptor::parse_toml(TINYCTHREAD_TOML).unwrap();
        let first = serde_json::to_string(&resolve(&desc).unwrap()).unwrap();
        let second = serde_json::to_string(&resolve(&desc).unwrap()).unwrap();
        assert_eq!(first, second);

        let reparsed = BuildDescriptor::parse_toml(TINYCTHREAD_TOML).unwrap();
        let third = serde_json::to_string(&resolve(&reparsed).unwrap()).unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn test_defines_concatenate() {
        let desc = BuildDescriptor::parse_toml(
            r#"
project = "demo"
[common]
defines = ["A"]
[platforms.win32.windows]
defines = ["B"]
"#,
        )
        .unwrap();
        let jobs = resolve(&desc).unwrap();
        assert_eq!(jobs[0].settings().defines, vec!["A", "B"]);
    }

    #[test]
    fn test_build_dir_replaced() {
        let desc = BuildDescriptor::parse_toml(
            r#"
project = "demo"
[common]
buildDir = "build"
[platforms.win32.windows]
buildDir = "build-win"
[platforms.linux.linux]
"#,
        )
        .unwrap();
        let jobs = resolve(&desc).unwrap();
        assert_eq!(jobs[0].settings().build_dir, "build-win");
        assert_eq!(jobs[1].settings().build_dir, "build");
    }

    #[test]
    fn test_empty_archs_yields_no_jobs() {
        let desc = BuildDescriptor::parse_toml(
            r#"
project = "demo"
[platforms.win32.windows]
[platforms.win32.android]
archs = []
"#,
        )
        .unwrap();
        let err = resolve(&desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Matrix);
    }

    #[test]
    fn test_family_without_targets_yields_no_jobs() {
        let desc = BuildDescriptor::parse_toml(
            r#"
project = "demo"
[platforms.win32.windows]
[platforms.linux]
"#,
        )
        .unwrap();
        let err = resolve(&desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Matrix);
        assert_eq!(err.path(), "platforms.linux");
    }

    #[test]
    fn test_duplicate_job_aborts_run() {
        let desc = BuildDescriptor::parse_toml(
            r#"
project = "demo"
[platforms.win32.android]
archs = ["x86"]
[platforms.linux.android]
archs = ["x86"]
"#,
        )
        .unwrap();
        let err = resolve(&desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateJob);
    }

    #[test]
    fn test_default_arch_example() {
        let desc = BuildDescriptor::parse_toml(NO_DEFAULT_ARCH_TOML).unwrap();
        let jobs = resolve(&desc).unwrap();
        assert_eq!(jobs.len(), 3);

        assert_eq!(jobs[0].os(), TargetOs::Windows);
        assert_eq!(jobs[0].arch(), &Arch::host());
        assert_eq!(jobs[1].os(), TargetOs::Android);
        assert_eq!(jobs[1].arch(), &Arch::new("x86"));
        assert_eq!(jobs[2].arch(), &Arch::new("arm64-v8a"));

        for job in &jobs {
            let settings = job.settings();
            assert_eq!(settings.defines, vec!["COMMON"]);
            assert_eq!(settings.subdirectories, vec!["demo"]);
            assert_eq!(settings.build_dir, "build");
            assert_eq!(settings.build_out_dir, "out");
        }
    }

    #[test]
    fn test_library_override_applies_last() {
        let desc = BuildDescriptor::parse_toml(
            r#"
project = "demo"
[common]
defines = ["COMMON"]
[common.options]
FAST = false
[common.libraries.core]
defines = ["CORE"]
[platforms.linux.linux]
defines = ["LINUX"]
[platforms.linux.linux.options]
FAST = true
[platforms.linux.linux.libraries.core]
defines = ["CORE_LINUX"]
options = [["FAST", false]]
[platforms.darwin.macos]
"#,
        )
        .unwrap();
        let jobs = resolve(&desc).unwrap();

        let linux = jobs[0].library("core").unwrap().settings();
        assert_eq!(linux.defines, vec!["COMMON", "LINUX", "CORE", "CORE_LINUX"]);
        assert_eq!(linux.options["FAST"], ConfigValue::Bool(false));
        assert_eq!(jobs[0].settings().options["FAST"], ConfigValue::Bool(true));

        let macos = jobs[1].library("core").unwrap().settings();
        assert_eq!(macos.defines, vec!["COMMON", "CORE"]);
    }

    #[test]
    fn test_templated_output_dirs() {
        let desc = BuildDescriptor::parse_toml(
            r#"
project = "demo"
[common]
buildDir = "build/{project}"
buildOutDir = "libs/{platform}/{os}-{arch}"
[platforms.win32.android]
archs = ["x86"]
"#,
        )
        .unwrap();
        let jobs = resolve(&desc).unwrap();
        assert_eq!(jobs[0].settings().build_dir, "build/demo");
        assert_eq!(jobs[0].settings().build_out_dir, "libs/win32/android-x86");
    }

    #[test]
    fn test_option_type_conflict_aborts_run() {
        let desc = BuildDescriptor::parse_toml(
            r#"
project = "demo"
[common]
options = [["SHARED", true]]
[platforms.linux.linux]
options = [["SHARED", "ON"]]
"#,
        )
        .unwrap();
        let err = resolve(&desc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MergeTypeConflict);
        assert_eq!(err.path(), "platforms.linux.linux.options.SHARED");
    }
}
