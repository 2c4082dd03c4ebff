//! Build plans.
//!
//! A BuildPlan is the resolved job list for one descriptor, optionally
//! narrowed by a [`JobFilter`]. It is what `xbuild plan` prints and what
//! `xbuild build` executes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::job::ResolvedJob;
use crate::core::platform::{PlatformFamily, TargetOs};
use crate::util::fs::relative_path;

/// The jobs to run for one descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub project: String,

    /// Path of the descriptor the plan was resolved from
    pub descriptor: PathBuf,

    /// Jobs in declaration order
    pub jobs: Vec<ResolvedJob>,
}

/// Narrows a plan to a subset of the matrix. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub platform: Option<PlatformFamily>,
    pub os: Option<TargetOs>,
    pub arch: Option<String>,
}

impl JobFilter {
    pub fn is_empty(&self) -> bool {
        *self == JobFilter::default()
    }

    pub fn matches(&self, job: &ResolvedJob) -> bool {
        self.platform.map_or(true, |p| p == job.platform())
            && self.os.map_or(true, |os| os == job.os())
            && self
                .arch
                .as_deref()
                .map_or(true, |arch| arch == job.arch().as_str())
    }
}

impl BuildPlan {
    pub fn new(project: impl Into<String>, descriptor: PathBuf, jobs: Vec<ResolvedJob>) -> Self {
        BuildPlan {
            project: project.into(),
            descriptor,
            jobs,
        }
    }

    /// Keep only the jobs the filter matches, preserving order.
    ///
    /// Filtering happens after validation, so a filtered plan is never used
    /// to hide a conflict elsewhere in the matrix.
    pub fn filter(mut self, filter: &JobFilter) -> Self {
        if !filter.is_empty() {
            self.jobs.retain(|job| filter.matches(job));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Serialize the plan as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize build plan")
    }

    /// Render a human-readable table of the plan.
    ///
    /// Directories are shown relative to the descriptor's directory.
    pub fn render_table(&self) -> String {
        let rows: Vec<[String; 4]> = self
            .jobs
            .iter()
            .map(|job| {
                let root = job.source_root();
                [
                    job.label(),
                    relative_path(root, &job.binary_dir()).display().to_string(),
                    relative_path(root, &job.output_dir()).display().to_string(),
                    job.libraries()
                        .iter()
                        .map(|l| l.name())
                        .collect::<Vec<_>>()
                        .join(", "),
                ]
            })
            .collect();

        let header = ["JOB", "BUILD DIR", "OUTPUT DIR", "LIBRARIES"];
        let mut widths = header.map(str::len);
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        let mut out = String::new();
        let mut push_row = |cells: [&str; 4]| {
            let line = cells
                .iter()
                .zip(widths)
                .map(|(cell, w)| format!("{:<w$}", cell, w = w))
                .collect::<Vec<_>>()
                .join("  ");
            out.push_str(line.trim_end());
            out.push('\n');
        };

        push_row(header);
        for row in &rows {
            push_row([&row[0], &row[1], &row[2], &row[3]]);
        }
        out
    }
}
