//! xbuild - Cross-platform CMake build orchestration
//!
//! This crate turns a declarative build descriptor into a matrix of
//! (platform family, target OS, architecture) jobs, resolves each job's
//! layered settings, and drives CMake for every job.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test fixtures for xbuild unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides sample descriptors and a recording build invoker.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{BuildDescriptor, ResolvedJob};
pub use resolver::{resolve, ResolveError};
pub use util::context::GlobalContext;
