//! xbuild CLI - Cross-platform CMake build orchestration

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use xbuild::resolver::ResolveError;
use xbuild::util::diagnostic::emit;
use xbuild::util::GlobalContext;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;
    let descriptor = cli.descriptor.clone();

    if let Err(e) = run(cli) {
        // Resolution errors carry their own context and suggestions
        match e.chain().find_map(|c| c.downcast_ref::<ResolveError>()) {
            Some(resolve_err) => {
                let mut diag = resolve_err.to_diagnostic();
                if let Some(path) = locate_descriptor(descriptor) {
                    diag = diag.with_location(path);
                }
                emit(&diag, color);
            }
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn locate_descriptor(explicit: Option<PathBuf>) -> Option<PathBuf> {
    let mut ctx = GlobalContext::new().ok()?;
    ctx.set_descriptor(explicit);
    ctx.find_descriptor().ok()
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("xbuild=debug")
    } else {
        EnvFilter::new("xbuild=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(!cli.no_color);
    ctx.set_descriptor(cli.descriptor);

    // Execute command
    match cli.command {
        Commands::Plan(args) => commands::plan::execute(&ctx, args),
        Commands::Check => commands::check::execute(&ctx),
        Commands::Build(args) => commands::build::execute(&ctx, args),
        Commands::Init(args) => commands::init::execute(&ctx, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
