//! `xbuild init` command

use anyhow::Result;

use crate::cli::InitArgs;
use xbuild::ops::init;
use xbuild::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: InitArgs) -> Result<()> {
    let dir = match &args.path {
        Some(path) => ctx.resolve_path(path),
        None => ctx.cwd().to_path_buf(),
    };

    let descriptor = init(&dir, args.name.as_deref())?;
    eprintln!("     Created {}", descriptor.display());

    Ok(())
}
