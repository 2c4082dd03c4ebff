//! Command implementations

pub mod build;
pub mod check;
pub mod completions;
pub mod init;
pub mod plan;

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use xbuild::util::diagnostic::suggestions;
use xbuild::util::GlobalContext;

/// Locate the descriptor for a command, with a hint when there is none.
pub fn descriptor_path(ctx: &GlobalContext) -> Result<PathBuf> {
    ctx.find_descriptor()
        .map_err(|e| anyhow!("{}\n{}", e, suggestions::NO_DESCRIPTOR))
}
