//! Implementation of `xbuild build`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::cmake::require_cmake;
use crate::builder::{BuildExecutor, BuildInvoker, BuildPlan, BuildReport, CMakeInvoker, JobFilter};
use crate::ops::xbuild_plan::{plan, PlanOptions};
use crate::util::config::Config;
use crate::util::process::find_cmake;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Restrict the build to part of the matrix
    pub filter: JobFilter,

    /// Number of parallel jobs (overrides `[build] jobs`)
    pub jobs: Option<usize>,

    /// Keep building after a failure (or `[build] keep_going`)
    pub keep_going: bool,

    /// Print the commands instead of running them
    pub dry_run: bool,

    /// CMake generator (overrides `[cmake] generator`)
    pub generator: Option<String>,

    /// Verbose output
    pub verbose: bool,
}

/// Result of a build.
#[derive(Debug)]
pub enum BuildResult {
    /// Commands each job would run, keyed by job label
    DryRun(Vec<(String, Vec<String>)>),
    /// Outcome of an actual build
    Built(BuildReport),
}

/// Resolve the descriptor and build every selected job with CMake.
pub fn build(descriptor_path: &Path, opts: &BuildOptions, config: &Config) -> Result<BuildResult> {
    let plan = plan(
        descriptor_path,
        &PlanOptions {
            filter: opts.filter.clone(),
        },
    )?;
    tracing::info!("Planned {} job(s) for `{}`", plan.len(), plan.project);

    if opts.dry_run {
        // A dry run only prints commands, so cmake need not be installed
        let program = find_cmake(config.cmake.program.as_deref()).unwrap_or_else(|| PathBuf::from("cmake"));
        let invoker = CMakeInvoker::new(program, config).generator(opts.generator.clone());
        let commands = plan
            .jobs
            .iter()
            .map(|job| Ok((job.label(), invoker.describe(job)?)))
            .collect::<Result<Vec<_>>>()?;
        return Ok(BuildResult::DryRun(commands));
    }

    let program = require_cmake(config)?;
    let invoker = CMakeInvoker::new(program, config).generator(opts.generator.clone());
    match invoker.version() {
        Ok(version) => tracing::debug!("using {} ({})", invoker.program().display(), version),
        Err(e) => tracing::warn!("could not query cmake version: {:#}", e),
    }

    build_plan(&plan, &invoker, opts, config).map(BuildResult::Built)
}

/// Execute an already resolved plan with the given invoker.
pub fn build_plan(
    plan: &BuildPlan,
    invoker: &dyn BuildInvoker,
    opts: &BuildOptions,
    config: &Config,
) -> Result<BuildReport> {
    BuildExecutor::new(invoker)
        .jobs(opts.jobs.or(config.build.jobs))
        .keep_going(opts.keep_going || config.build.keep_going())
        .verbose(opts.verbose)
        .execute(&plan.jobs)
}
