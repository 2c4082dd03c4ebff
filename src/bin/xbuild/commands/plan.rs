//! `xbuild plan` command

use anyhow::Result;

use crate::cli::PlanArgs;
use crate::commands::descriptor_path;
use xbuild::ops::{plan, PlanOptions};
use xbuild::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: PlanArgs) -> Result<()> {
    let path = descriptor_path(ctx)?;
    let opts = PlanOptions {
        filter: args.filter.to_filter(),
    };

    let plan = plan(&path, &opts)?;

    if args.json {
        println!("{}", plan.to_json()?);
    } else {
        print!("{}", plan.render_table());
        eprintln!("     Planned {} job(s) for `{}`", plan.len(), plan.project);
    }

    Ok(())
}
