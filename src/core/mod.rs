//! Core data structures for xbuild.
//!
//! This module contains the foundational types used throughout xbuild:
//! - The build descriptor (common baseline and platform overrides)
//! - The closed platform and OS vocabularies
//! - Resolved jobs handed to build invokers

pub mod descriptor;
pub mod job;
pub mod platform;
pub mod value;

pub use descriptor::{
    BuildDescriptor, CommonConfig, Layer, PlatformConfig, TargetConfig, DESCRIPTOR_ALIAS,
    DESCRIPTOR_NAME,
};
pub use job::{JobKey, ResolvedJob, ResolvedLibrary, Settings};
pub use platform::{Arch, PlatformFamily, TargetOs};
pub use value::{ConfigValue, ValueKind};
