//! Build executor with progress reporting.
//!
//! Jobs are independent by construction (no two share a build or output
//! directory), so they may run on a rayon pool. The first failure stops the run unless
//! `keep_going` is set; jobs not yet started are reported as skipped.

use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::builder::copy::apply_copy_rules;
use crate::builder::BuildInvoker;
use crate::core::job::{JobKey, ResolvedJob};

/// What happened to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Built, and copy rules applied
    Succeeded { copied: u64 },
    /// The build system reported failure
    Failed { code: Option<i32> },
    /// The job could not be run at all (or its copy step failed)
    Errored { message: String },
    /// Not started because an earlier job failed
    Skipped,
}

/// Outcome of one job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub key: JobKey,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Succeeded { .. })
    }
}

/// Outcomes of a whole run, in job order.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub outcomes: Vec<JobOutcome>,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, JobStatus::Failed { .. } | JobStatus::Errored { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == JobStatus::Skipped)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::is_success)
    }
}

/// Build executor with progress tracking.
pub struct BuildExecutor<'a> {
    invoker: &'a dyn BuildInvoker,
    jobs: Option<usize>,
    keep_going: bool,
    copy: bool,
    verbose: bool,
}

impl<'a> BuildExecutor<'a> {
    /// Create a new build executor.
    pub fn new(invoker: &'a dyn BuildInvoker) -> Self {
        BuildExecutor {
            invoker,
            jobs: None,
            keep_going: false,
            copy: true,
            verbose: false,
        }
    }

    /// Number of jobs to build in parallel (None or 1 = sequential).
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Keep building after a failure.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Apply copy rules after each successful job.
    pub fn copy(mut self, copy: bool) -> Self {
        self.copy = copy;
        self
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute all jobs.
    pub fn execute(&self, jobs: &[ResolvedJob]) -> Result<BuildReport> {
        let start = Instant::now();

        // Progress bar only when it would not fight with log output
        let pb = if !self.verbose && jobs.len() > 1 {
            let pb = ProgressBar::new(jobs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .context("invalid progress bar template")?
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let abort = AtomicBool::new(false);
        let run = |job: &ResolvedJob| -> JobOutcome {
            let outcome = self.run_job(job, &abort);
            pb.set_message(job.label());
            pb.inc(1);
            outcome
        };

        let outcomes: Vec<JobOutcome> = match self.jobs {
            Some(n) if n > 1 => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .context("failed to create build thread pool")?;
                pool.install(|| jobs.par_iter().map(run).collect())
            }
            _ => jobs.iter().map(run).collect(),
        };

        pb.finish_and_clear();

        let report = BuildReport {
            outcomes,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Finished {} job(s), {} failed, {} skipped in {:.2}s",
            report.succeeded(),
            report.failed(),
            report.skipped(),
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }

    fn run_job(&self, job: &ResolvedJob, abort: &AtomicBool) -> JobOutcome {
        let key = job.key().clone();
        if abort.load(Ordering::SeqCst) {
            return JobOutcome {
                key,
                status: JobStatus::Skipped,
            };
        }

        tracing::info!("Building {}", job.label());
        let status = match self.invoker.execute(job) {
            Ok(status) if status.success() => self.after_success(job),
            Ok(status) => failed(status),
            Err(e) => JobStatus::Errored {
                message: format!("{:#}", e),
            },
        };

        if !matches!(status, JobStatus::Succeeded { .. }) {
            tracing::warn!("{} failed: {}", job.label(), describe(&status));
            if !self.keep_going {
                abort.store(true, Ordering::SeqCst);
            }
        }

        JobOutcome { key, status }
    }

    fn after_success(&self, job: &ResolvedJob) -> JobStatus {
        if !self.copy {
            return JobStatus::Succeeded { copied: 0 };
        }
        match apply_copy_rules(job) {
            Ok(copied) => JobStatus::Succeeded { copied },
            Err(e) => JobStatus::Errored {
                message: format!("{:#}", e),
            },
        }
    }
}

fn failed(status: ExitStatus) -> JobStatus {
    JobStatus::Failed {
        code: status.code(),
    }
}

/// Short human description of a job status.
pub fn describe(status: &JobStatus) -> String {
    match status {
        JobStatus::Succeeded { copied } => format!("ok ({} file(s) copied)", copied),
        JobStatus::Failed { code: Some(code) } => format!("build exited with code {}", code),
        JobStatus::Failed { code: None } => "build terminated by signal".to_string(),
        JobStatus::Errored { message } => message.clone(),
        JobStatus::Skipped => "skipped".to_string(),
    }
}
