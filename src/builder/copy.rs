//! Post-build copy rules.
//!
//! Sources are relative to the descriptor root; destinations are relative to
//! the job's output directory. Directories are copied recursively.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::core::job::ResolvedJob;
use crate::util::fs::copy_path;

/// A copy rule made concrete for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyAction {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Collect the copy actions for a job and its libraries.
///
/// Library rules land in the library's own output directory; a rule the
/// library inherited unchanged from the job is only performed once.
pub fn copy_actions(job: &ResolvedJob) -> Vec<CopyAction> {
    let root = job.source_root();
    let mut actions: Vec<CopyAction> = Vec::new();

    let mut push = |from: PathBuf, to: PathBuf| {
        let action = CopyAction { from, to };
        if !actions.contains(&action) {
            actions.push(action);
        }
    };

    let out = job.output_dir();
    for (src, dst) in &job.settings().copy {
        push(root.join(src), out.join(dst));
    }

    for lib in job.libraries() {
        let lib_out = job.output_dir_for(lib.settings());
        for (src, dst) in &lib.settings().copy {
            push(root.join(src), lib_out.join(dst));
        }
    }

    actions
}

/// Apply a job's copy rules. Returns the number of files copied.
pub fn apply_copy_rules(job: &ResolvedJob) -> Result<u64> {
    let mut copied = 0;

    for action in copy_actions(job) {
        if !action.from.exists() {
            bail!(
                "copy source `{}` does not exist (job {})",
                action.from.display(),
                job.label()
            );
        }
        tracing::debug!(
            "{}: copying {} -> {}",
            job.label(),
            action.from.display(),
            action.to.display()
        );
        copied += copy_path(&action.from, &action.to)?;
    }

    Ok(copied)
}
