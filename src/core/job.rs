//! Resolved build jobs.
//!
//! A job is one (platform family, target OS, architecture) triple with every
//! layer applied. Jobs are produced by the resolver and read by invokers; no
//! mutable access is exposed after construction.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::platform::{Arch, PlatformFamily, TargetOs};
use crate::core::value::ConfigValue;

/// The matrix coordinates of a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JobKey {
    pub platform: PlatformFamily,
    pub os: TargetOs,
    pub arch: Arch,
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.platform, self.os, self.arch)
    }
}

/// Fully merged settings, with every scalar decided.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub variables: IndexMap<String, ConfigValue>,
    pub defines: Vec<String>,
    pub options: IndexMap<String, ConfigValue>,
    pub copy: IndexMap<String, String>,
    pub subdirectories: Vec<String>,
    pub build_dir: String,
    pub build_out_dir: String,
    pub build_flags: Vec<String>,
}

/// Settings for one library within a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLibrary {
    name: String,
    #[serde(flatten)]
    settings: Settings,
}

impl ResolvedLibrary {
    pub(crate) fn new(name: impl Into<String>, settings: Settings) -> Self {
        ResolvedLibrary {
            name: name.into(),
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// One fully resolved build unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedJob {
    project: String,
    #[serde(flatten)]
    key: JobKey,
    #[serde(flatten)]
    settings: Settings,
    libraries: Vec<ResolvedLibrary>,
    source_root: PathBuf,
}

impl ResolvedJob {
    pub(crate) fn new(
        project: impl Into<String>,
        key: JobKey,
        settings: Settings,
        libraries: Vec<ResolvedLibrary>,
        source_root: PathBuf,
    ) -> Self {
        ResolvedJob {
            project: project.into(),
            key,
            settings,
            libraries,
            source_root,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn key(&self) -> &JobKey {
        &self.key
    }

    pub fn platform(&self) -> PlatformFamily {
        self.key.platform
    }

    pub fn os(&self) -> TargetOs {
        self.key.os
    }

    pub fn arch(&self) -> &Arch {
        &self.key.arch
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn libraries(&self) -> &[ResolvedLibrary] {
        &self.libraries
    }

    pub fn library(&self, name: &str) -> Option<&ResolvedLibrary> {
        self.libraries.iter().find(|l| l.name == name)
    }

    /// Directory the descriptor lives in.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Short `family/os/arch` label for logs and progress output.
    pub fn label(&self) -> String {
        self.key.to_string()
    }

    /// Concrete CMake binary directory: `<buildDir>/<platform>/<os>/<arch>`.
    ///
    /// The family is part of the path, so two families building the same OS
    /// never share a CMake cache.
    pub fn binary_dir(&self) -> PathBuf {
        self.source_root
            .join(&self.settings.build_dir)
            .join(self.key.platform.as_str())
            .join(self.key.os.as_str())
            .join(self.key.arch.as_str())
    }

    /// Concrete artifact directory: `<buildOutDir>/<os>/<arch>`.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir_for(&self.settings)
    }

    /// Artifact directory for library settings, which may move `buildOutDir`.
    pub fn output_dir_for(&self, settings: &Settings) -> PathBuf {
        self.source_root
            .join(&settings.build_out_dir)
            .join(self.key.os.as_str())
            .join(self.key.arch.as_str())
    }
}
