//! Matrix expansion: descriptor -> ordered (family, OS, arch) units.
//!
//! Order mirrors declaration order in the descriptor: families, then the OSes
//! nested under each, then each OS's architecture list.

use crate::core::descriptor::{child, BuildDescriptor, TargetConfig};
use crate::core::job::JobKey;
use crate::core::platform::{Arch, TargetOs};
use crate::resolver::errors::ResolveError;
use crate::resolver::validate::check_archs;

/// One cell of the build matrix, still pointing into the descriptor.
#[derive(Debug, Clone)]
pub struct ExpansionUnit<'d> {
    pub key: JobKey,
    pub target: &'d TargetConfig,
    /// Field path of the target, e.g. `platforms.win32.android`
    pub path: String,
}

/// Where a unit's architecture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchSource {
    Target,
    Common,
    Default,
}

/// Expand every declared target into one unit per architecture.
pub fn expand(descriptor: &BuildDescriptor) -> Result<Vec<ExpansionUnit<'_>>, ResolveError> {
    let mut units = Vec::new();

    for (family, platform) in &descriptor.platforms {
        let family_path = child("platforms", family.as_str());
        if platform.targets.is_empty() {
            return Err(ResolveError::NoTargets {
                platform: *family,
                path: family_path,
            });
        }

        for (os, target) in &platform.targets {
            let path = child(&family_path, os.as_str());
            let (archs, source) = select_archs(descriptor, *os, target);

            let archs_path = match source {
                ArchSource::Target => child(&path, "archs"),
                _ => "common.archs".to_string(),
            };
            check_archs(*family, *os, &archs, &archs_path)?;

            tracing::debug!(
                "expanding {}/{} over {} arch(s) from {:?}",
                family,
                os,
                archs.len(),
                source
            );

            for arch in archs {
                units.push(ExpansionUnit {
                    key: JobKey {
                        platform: *family,
                        os: *os,
                        arch,
                    },
                    target,
                    path: path.clone(),
                });
            }
        }
    }

    Ok(units)
}

/// Pick the architecture list for a target.
///
/// Target `archs` replaces `common.archs`, which replaces the OS default.
pub fn select_archs(
    descriptor: &BuildDescriptor,
    os: TargetOs,
    target: &TargetConfig,
) -> (Vec<Arch>, ArchSource) {
    if let Some(archs) = &target.archs {
        return (archs.clone(), ArchSource::Target);
    }
    if let Some(archs) = &descriptor.common.archs {
        return (archs.clone(), ArchSource::Common);
    }
    (vec![os.default_arch()], ArchSource::Default)
}
