//! Implementation of `xbuild plan` and `xbuild check`.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::builder::{BuildPlan, JobFilter};
use crate::core::descriptor::BuildDescriptor;
use crate::resolver::resolve;
use crate::util::diagnostic::suggestions;

/// Options for resolving a plan.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Restrict the plan to part of the matrix
    pub filter: JobFilter,
}

/// Load and resolve a descriptor into a build plan.
///
/// The whole descriptor is validated before the filter is applied, so a
/// filter never hides an error in a part of the matrix it excludes.
pub fn plan(descriptor_path: &Path, opts: &PlanOptions) -> Result<BuildPlan> {
    let descriptor = BuildDescriptor::load(descriptor_path)?;

    let jobs = resolve(&descriptor)
        .with_context(|| format!("failed to resolve {}", descriptor_path.display()))?;
    tracing::debug!("resolved {} job(s)", jobs.len());

    let plan = BuildPlan::new(
        descriptor.project.clone(),
        descriptor_path.to_path_buf(),
        jobs,
    )
    .filter(&opts.filter);

    if plan.is_empty() && !opts.filter.is_empty() {
        bail!(
            "no jobs match the requested platform, os or arch\n{}",
            suggestions::NO_MATCHING_JOBS
        );
    }

    Ok(plan)
}

/// Resolve and validate a descriptor, returning the number of jobs.
pub fn check(descriptor_path: &Path) -> Result<usize> {
    Ok(plan(descriptor_path, &PlanOptions::default())?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::TargetOs;
    use crate::resolver::{ErrorKind, ResolveError};
    use crate::test_support::TINYCTHREAD_TOML;
    use tempfile::TempDir;

    fn write_descriptor(content: &str) -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("xbuild.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_plan_from_file() {
        let (_tmp, path) = write_descriptor(TINYCTHREAD_TOML);
        let plan = plan(&path, &PlanOptions::default()).unwrap();
        assert_eq!(plan.project, "tinycthread");
        assert_eq!(plan.len(), 7);
        assert_eq!(check(&path).unwrap(), 7);
    }

    #[test]
    fn test_filter_applies_after_validation() {
        let content = r#"
[common]
project = "demo"
buildOutDir = "out"
[platforms.win32.windows]
archs = ["x64"]
[platforms.linux.linux]
archs = ["x64"]
buildOutDir = "out"
[platforms.darwin.macos]
archs = []
"#;
        let (_tmp, path) = write_descriptor(content);
        let opts = PlanOptions {
            filter: JobFilter {
                os: Some(TargetOs::Linux),
                ..Default::default()
            },
        };

        let err = plan(&path, &opts).unwrap_err();
        let resolve_err = err
            .chain()
            .find_map(|e| e.downcast_ref::<ResolveError>())
            .unwrap();
        assert_eq!(resolve_err.kind(), ErrorKind::Matrix);
    }

    #[test]
    fn test_filter_matching_nothing_fails() {
        let (_tmp, path) = write_descriptor(TINYCTHREAD_TOML);
        let opts = PlanOptions {
            filter: JobFilter {
                arch: Some("riscv64".to_string()),
                ..Default::default()
            },
        };

        let err = plan(&path, &opts).unwrap_err();
        assert!(err.to_string().contains("no jobs match"));
    }

    #[test]
    fn test_missing_descriptor() {
        let tmp = TempDir::new().unwrap();
        let err = plan(&tmp.path().join("xbuild.toml"), &PlanOptions::default()).unwrap_err();
        assert!(err.to_string().contains("failed to read descriptor"));
    }
}
