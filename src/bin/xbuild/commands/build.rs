//! `xbuild build` command

use anyhow::{bail, Result};

use crate::cli::BuildArgs;
use crate::commands::descriptor_path;
use xbuild::builder::executor::{describe, JobStatus};
use xbuild::ops::{build, BuildOptions, BuildResult};
use xbuild::util::diagnostic::{emit, suggestions, Diagnostic};
use xbuild::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: BuildArgs) -> Result<()> {
    let path = descriptor_path(ctx)?;
    let project_root = path.parent().unwrap_or(ctx.cwd());
    let config = ctx.load_config(project_root);

    let opts = BuildOptions {
        filter: args.filter.to_filter(),
        jobs: args.jobs,
        keep_going: args.keep_going,
        dry_run: args.dry_run,
        generator: args.generator,
        verbose: ctx.is_verbose(),
    };

    match build(&path, &opts, &config)? {
        BuildResult::DryRun(commands) => {
            for (label, lines) in commands {
                println!("# {}", label);
                for line in lines {
                    println!("{}", line);
                }
            }
            Ok(())
        }
        BuildResult::Built(report) => {
            for outcome in &report.outcomes {
                if let JobStatus::Failed { .. } | JobStatus::Errored { .. } = outcome.status {
                    let diag = Diagnostic::warning(format!("job {} did not build", outcome.key))
                        .with_context(describe(&outcome.status));
                    emit(&diag, ctx.color());
                }
            }

            if !report.is_success() {
                bail!(
                    "{} of {} job(s) failed ({} skipped)\n{}",
                    report.failed(),
                    report.outcomes.len(),
                    report.skipped(),
                    suggestions::BUILD_FAILED
                );
            }

            eprintln!(
                "    Finished {} job(s) in {:.2}s",
                report.succeeded(),
                report.elapsed.as_secs_f64()
            );
            Ok(())
        }
    }
}
