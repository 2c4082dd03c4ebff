//! Per-invocation state shared by every command: working directory,
//! output flags and descriptor discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::descriptor::{DESCRIPTOR_ALIAS, DESCRIPTOR_NAME};
use crate::util::config::{self, Config};

/// Error locating a build descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("could not find `{}` in `{}` or any parent directory", DESCRIPTOR_NAME, .dir.display())]
    NotFound { dir: PathBuf },

    #[error("descriptor `{}` does not exist", .path.display())]
    Missing { path: PathBuf },

    #[error("both `{}` and `{}` exist; remove one", .primary.display(), .alias.display())]
    Ambiguous { primary: PathBuf, alias: PathBuf },
}

/// Find the descriptor in a single directory.
pub fn find_descriptor_in(dir: &Path) -> Result<PathBuf, DescriptorError> {
    let primary = dir.join(DESCRIPTOR_NAME);
    let alias = dir.join(DESCRIPTOR_ALIAS);

    match (primary.is_file(), alias.is_file()) {
        (true, true) => Err(DescriptorError::Ambiguous { primary, alias }),
        (true, false) => Ok(primary),
        (false, true) => Ok(alias),
        (false, false) => Err(DescriptorError::NotFound {
            dir: dir.to_path_buf(),
        }),
    }
}

/// State derived from the command line and the environment.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Directory xbuild was started in
    cwd: PathBuf,

    /// Home directory for global xbuild data (~/.xbuild/)
    home: Option<PathBuf>,

    /// `--verbose` was given
    verbose: bool,

    /// ANSI colors on diagnostics
    color: bool,

    /// Descriptor given on the command line, bypassing discovery
    descriptor: Option<PathBuf>,
}

impl GlobalContext {
    /// Context rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Context rooted at `cwd`.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            home: config::global_config_dir(),
            verbose: false,
            color: true,
            descriptor: None,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Use an explicit descriptor instead of searching for one.
    pub fn set_descriptor(&mut self, path: Option<PathBuf>) {
        self.descriptor = path.map(|p| self.resolve_path(&p));
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// `~/.xbuild/config.toml`, when a home directory exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join("config.toml"))
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Resolve a user-supplied path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Find the descriptor starting from cwd and searching upward.
    ///
    /// Returns an error if both descriptor files exist in the same directory.
    /// An explicit descriptor is returned as is when it exists.
    pub fn find_descriptor(&self) -> Result<PathBuf, DescriptorError> {
        if let Some(path) = &self.descriptor {
            if path.is_dir() {
                return find_descriptor_in(path);
            }
            if !path.is_file() {
                return Err(DescriptorError::Missing { path: path.clone() });
            }
            return Ok(path.clone());
        }

        let mut current = self.cwd.clone();
        loop {
            match find_descriptor_in(&current) {
                Ok(path) => return Ok(path),
                Err(DescriptorError::NotFound { .. }) => {
                    if !current.pop() {
                        return Err(DescriptorError::NotFound {
                            dir: self.cwd.clone(),
                        });
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Load the merged global and project configuration for a project root.
    pub fn load_config(&self, project_root: &Path) -> Config {
        config::load_config(
            self.config_path().as_deref(),
            &config::project_config_path(project_root),
        )
    }
}
