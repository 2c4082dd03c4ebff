//! Structural validation of descriptors and resolved jobs.
//!
//! Key and architecture checks run while the descriptor is read and expanded;
//! the job-level checks run in [`Validator`] once every job is merged. The
//! policy is fail-closed: the first failure rejects the whole job list.

use std::collections::HashMap;

use crate::core::descriptor::{child, BuildDescriptor};
use crate::core::job::{JobKey, ResolvedJob};
use crate::core::platform::{Arch, PlatformFamily, TargetOs};
use crate::resolver::errors::ResolveError;

/// Parse a `platforms` key into a family.
pub fn check_platform_key(key: &str, path: &str) -> Result<PlatformFamily, ResolveError> {
    key.parse().map_err(|_| ResolveError::UnknownPlatform {
        key: key.to_string(),
        path: path.to_string(),
    })
}

/// Reject an explicitly empty architecture list.
pub fn check_archs(
    platform: PlatformFamily,
    os: TargetOs,
    archs: &[Arch],
    path: &str,
) -> Result<(), ResolveError> {
    if archs.is_empty() {
        return Err(ResolveError::EmptyArchs {
            platform,
            os,
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Validator lifecycle. `Accepted` and `Rejected` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationState {
    Pending,
    Validating,
    Accepted,
    Rejected(ResolveError),
}

impl ValidationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ValidationState::Accepted | ValidationState::Rejected(_))
    }
}

/// Job-level checks over a fully merged job list.
pub struct Validator<'d> {
    descriptor: &'d BuildDescriptor,
    state: ValidationState,
}

impl<'d> Validator<'d> {
    pub fn new(descriptor: &'d BuildDescriptor) -> Self {
        Validator {
            descriptor,
            state: ValidationState::Pending,
        }
    }

    pub fn state(&self) -> &ValidationState {
        &self.state
    }

    /// Validate the jobs once.
    ///
    /// Calling this again after a verdict returns the same verdict without
    /// re-running the checks.
    pub fn validate(&mut self, jobs: &[ResolvedJob]) -> Result<(), ResolveError> {
        match &self.state {
            ValidationState::Accepted => return Ok(()),
            ValidationState::Rejected(err) => return Err(err.clone()),
            ValidationState::Pending | ValidationState::Validating => {}
        }

        self.state = ValidationState::Validating;
        let verdict = self
            .check_library_references()
            .and_then(|()| check_duplicates(jobs));

        match verdict {
            Ok(()) => {
                tracing::debug!("validator accepted {} job(s)", jobs.len());
                self.state = ValidationState::Accepted;
                Ok(())
            }
            Err(err) => {
                tracing::debug!("validator rejected: {}", err);
                self.state = ValidationState::Rejected(err.clone());
                Err(err)
            }
        }
    }

    /// Every target-level library override must name a declared library.
    fn check_library_references(&self) -> Result<(), ResolveError> {
        let declared = &self.descriptor.common.libraries;

        for (family, platform) in &self.descriptor.platforms {
            for (os, target) in &platform.targets {
                for name in target.libraries.keys() {
                    if !declared.contains_key(name) {
                        let path = format!("platforms.{}.{}.libraries", family, os);
                        return Err(ResolveError::UnknownLibrary {
                            library: name.clone(),
                            path: child(&path, name),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// No two jobs may write the same OS and architecture into one output directory.
fn check_duplicates(jobs: &[ResolvedJob]) -> Result<(), ResolveError> {
    let mut seen: HashMap<(TargetOs, &Arch, &str), &JobKey> = HashMap::new();

    for job in jobs {
        let slot = (job.os(), job.arch(), job.settings().build_out_dir.as_str());
        if let Some(first) = seen.insert(slot, job.key()) {
            return Err(ResolveError::DuplicateJob {
                os: job.os(),
                arch: job.arch().clone(),
                build_out_dir: job.settings().build_out_dir.clone(),
                first: first.clone(),
                second: job.key().clone(),
            });
        }
    }

    Ok(())
}
