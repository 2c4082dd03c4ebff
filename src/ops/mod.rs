//! High-level operations.
//!
//! This module contains the implementation of xbuild commands.

pub mod xbuild_build;
pub mod xbuild_init;
pub mod xbuild_plan;

pub use xbuild_build::{build, build_plan, BuildOptions, BuildResult};
pub use xbuild_init::init;
pub use xbuild_plan::{check, plan, PlanOptions};
