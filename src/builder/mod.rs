//! Build invocation.
//!
//! Resolved jobs are handed to a [`BuildInvoker`], which owns everything
//! about actually compiling: the resolver never inspects exit statuses.

pub mod cmake;
pub mod copy;
pub mod executor;
pub mod plan;

pub use cmake::CMakeInvoker;
pub use executor::{BuildExecutor, BuildReport, JobOutcome, JobStatus};
pub use plan::{BuildPlan, JobFilter};

use std::process::ExitStatus;

use anyhow::Result;

use crate::core::job::ResolvedJob;

/// Runs one resolved job with an external build system.
///
/// Implementations must be shareable across threads: the executor may hand
/// independent jobs to several workers at once.
pub trait BuildInvoker: Send + Sync {
    /// Configure and build the job, returning the build system's status.
    fn execute(&self, job: &ResolvedJob) -> Result<ExitStatus>;
}
