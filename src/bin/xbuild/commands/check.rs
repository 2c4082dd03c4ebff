//! `xbuild check` command

use anyhow::Result;

use crate::commands::descriptor_path;
use xbuild::ops::check;
use xbuild::util::GlobalContext;

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    let path = descriptor_path(ctx)?;
    let count = check(&path)?;

    eprintln!("     Checked {}: {} job(s)", path.display(), count);
    Ok(())
}
