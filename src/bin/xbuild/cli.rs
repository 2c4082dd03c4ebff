//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use xbuild::builder::JobFilter;
use xbuild::core::{PlatformFamily, TargetOs};

/// xbuild - Build CMake projects for every platform, OS and architecture
#[derive(Parser)]
#[command(name = "xbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to the build descriptor (defaults to searching for xbuild.toml)
    #[arg(long, global = true, env = "XBUILD_DESCRIPTOR")]
    pub descriptor: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the resolved build jobs
    Plan(PlanArgs),

    /// Validate the descriptor without building
    Check,

    /// Configure and build every job with CMake
    Build(BuildArgs),

    /// Write a starter xbuild.toml
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Selects part of the job matrix.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Only jobs of this platform family (win32, linux, darwin)
    #[arg(long)]
    pub platform: Option<PlatformFamily>,

    /// Only jobs for this target OS (windows, android, linux, macos, ios)
    #[arg(long)]
    pub os: Option<TargetOs>,

    /// Only jobs for this architecture
    #[arg(long)]
    pub arch: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> JobFilter {
        JobFilter {
            platform: self.platform,
            os: self.os,
            arch: self.arch.clone(),
        }
    }
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Number of jobs to build in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Keep building remaining jobs after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// Print the CMake commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// CMake generator (e.g. "Ninja")
    #[arg(short = 'G', long)]
    pub generator: Option<String>,
}

#[derive(Args)]
pub struct InitArgs {
    /// Project name (defaults to directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Directory to initialize (defaults to current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
