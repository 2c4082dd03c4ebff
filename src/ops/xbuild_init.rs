//! Implementation of `xbuild init`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::descriptor::{generate_default_descriptor, DESCRIPTOR_ALIAS, DESCRIPTOR_NAME};

/// Write a starter descriptor into `path`.
///
/// The project name defaults to the directory name. Fails if the directory
/// already has a descriptor in either encoding.
pub fn init(path: &Path, project: Option<&str>) -> Result<PathBuf> {
    for name in [DESCRIPTOR_NAME, DESCRIPTOR_ALIAS] {
        if path.join(name).exists() {
            bail!("`{}` already exists in `{}`", name, path.display());
        }
    }

    let project = match project {
        Some(name) => name.to_string(),
        None => path
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .with_context(|| {
                format!(
                    "cannot infer a project name from `{}`; pass --name",
                    path.display()
                )
            })?,
    };
    validate_project_name(&project)?;

    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))?;

    let descriptor_path = path.join(DESCRIPTOR_NAME);
    fs::write(&descriptor_path, generate_default_descriptor(&project))
        .with_context(|| format!("failed to write {}", DESCRIPTOR_NAME))?;

    // Build artifacts should not be committed
    let gitignore = path.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, "# xbuild artifacts\n/build/\n/libs/\n")
            .with_context(|| "failed to write .gitignore")?;
    }

    tracing::info!("Created `{}` for project `{}`", DESCRIPTOR_NAME, project);
    Ok(descriptor_path)
}

fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("project name must not be empty");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!(
            "invalid project name `{}`: use ASCII letters, digits, `_` or `-`",
            name
        );
    }
    Ok(())
}
