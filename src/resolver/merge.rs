//! Layer merging.
//!
//! Every job is built by folding layers left to right:
//! `common` < target OS < library (common declaration) < library (target override).
//!
//! Per-field rules:
//! - scalars (`buildDir`, `buildOutDir`) are replaced by the later layer
//! - sequences (`defines`, `buildFlags`, `subdirectories`) are concatenated,
//!   earlier entries first, duplicates kept
//! - mappings (`variables`, `options`, `copy`) are merged by key; a key keeps
//!   its first position and takes the later value
//!
//! Replacement and key merges are idempotent. Sequence concatenation is not:
//! applying the same layer twice repeats its entries.

use indexmap::IndexMap;

use crate::core::descriptor::{child, BuildDescriptor, Layer};
use crate::core::job::{JobKey, ResolvedJob, ResolvedLibrary, Settings};
use crate::core::value::ConfigValue;
use crate::resolver::errors::ResolveError;
use crate::resolver::matrix::ExpansionUnit;

/// Build directory used when no layer sets one.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Output directory used when no layer sets one.
pub const DEFAULT_BUILD_OUT_DIR: &str = "libs";

/// Placeholders accepted in `buildDir` and `buildOutDir`.
pub const PLACEHOLDERS: [&str; 4] = ["project", "platform", "os", "arch"];

/// Merge `over` on top of `base`.
///
/// `path` names the overriding layer and is used for conflict reports.
pub fn merge_layers(base: &Layer, over: &Layer, path: &str) -> Result<Layer, ResolveError> {
    Ok(Layer {
        variables: merge_values(&base.variables, &over.variables, &child(path, "variables"))?,
        defines: concat(&base.defines, &over.defines),
        options: merge_values(&base.options, &over.options, &child(path, "options"))?,
        copy: merge_map(&base.copy, &over.copy),
        subdirectories: concat(&base.subdirectories, &over.subdirectories),
        build_dir: over.build_dir.clone().or_else(|| base.build_dir.clone()),
        build_out_dir: over
            .build_out_dir
            .clone()
            .or_else(|| base.build_out_dir.clone()),
        build_flags: concat(&base.build_flags, &over.build_flags),
    })
}

fn concat(base: &[String], over: &[String]) -> Vec<String> {
    base.iter().chain(over).cloned().collect()
}

fn merge_map(base: &IndexMap<String, String>, over: &IndexMap<String, String>) -> IndexMap<String, String> {
    let mut merged = base.clone();
    for (key, value) in over {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Merge scalar maps by key, rejecting overrides that change a value's kind.
fn merge_values(
    base: &IndexMap<String, ConfigValue>,
    over: &IndexMap<String, ConfigValue>,
    path: &str,
) -> Result<IndexMap<String, ConfigValue>, ResolveError> {
    let mut merged = base.clone();

    for (key, value) in over {
        if let Some(existing) = base.get(key) {
            if existing.kind() != value.kind() {
                return Err(ResolveError::MergeTypeConflict {
                    path: child(path, key),
                    expected: existing.kind().to_string(),
                    found: value.kind().to_string(),
                });
            }
        }
        merged.insert(key.clone(), value.clone());
    }

    Ok(merged)
}

/// Values available to path templates for one job.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub project: &'a str,
    pub key: &'a JobKey,
}

impl TemplateContext<'_> {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "project" => Some(self.project),
            "platform" => Some(self.key.platform.as_str()),
            "os" => Some(self.key.os.as_str()),
            "arch" => Some(self.key.arch.as_str()),
            _ => None,
        }
    }
}

/// Check that a path template only uses known placeholders.
pub fn check_template(template: &str, path: &str) -> Result<(), ResolveError> {
    for name in placeholders(template) {
        if !PLACEHOLDERS.contains(&name) {
            return Err(ResolveError::Schema {
                path: path.to_string(),
                message: format!(
                    "unknown placeholder `{{{}}}` (expected one of: {})",
                    name,
                    PLACEHOLDERS.join(", ")
                ),
            });
        }
    }
    Ok(())
}

/// Substitute `{project}`, `{platform}`, `{os}` and `{arch}`.
///
/// Unknown placeholders are left as written; they are rejected when the
/// descriptor is loaded.
pub fn interpolate(template: &str, ctx: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match ctx.lookup(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    template.split('{').skip(1).filter_map(|part| part.split_once('}')).map(|(name, _)| name)
}

/// Turn a merged layer into final settings: defaults filled, templates expanded.
pub fn finalize(layer: Layer, ctx: &TemplateContext<'_>) -> Settings {
    let build_dir = layer.build_dir.as_deref().unwrap_or(DEFAULT_BUILD_DIR);
    let build_out_dir = layer.build_out_dir.as_deref().unwrap_or(DEFAULT_BUILD_OUT_DIR);

    Settings {
        build_dir: interpolate(build_dir, ctx),
        build_out_dir: interpolate(build_out_dir, ctx),
        variables: layer.variables,
        defines: layer.defines,
        options: layer.options,
        copy: layer.copy,
        subdirectories: layer.subdirectories,
        build_flags: layer.build_flags,
    }
}

/// Resolve one matrix unit into a job.
pub fn resolve_job(
    descriptor: &BuildDescriptor,
    unit: &ExpansionUnit<'_>,
) -> Result<ResolvedJob, ResolveError> {
    let ctx = TemplateContext {
        project: &descriptor.project,
        key: &unit.key,
    };

    let job_layer = merge_layers(&descriptor.common.settings, &unit.target.settings, &unit.path)?;

    let mut libraries = Vec::with_capacity(descriptor.common.libraries.len());
    for (name, declared) in &descriptor.common.libraries {
        let declared_path = child("common.libraries", name);
        let mut layer = merge_layers(&job_layer, declared, &declared_path)?;

        if let Some(over) = unit.target.libraries.get(name) {
            let over_path = child(&child(&unit.path, "libraries"), name);
            layer = merge_layers(&layer, over, &over_path)?;
        }

        libraries.push(ResolvedLibrary::new(name.clone(), finalize(layer, &ctx)));
    }

    let settings = finalize(job_layer, &ctx);
    tracing::debug!(
        "resolved {}: {} define(s), {} option(s), {} library(ies), out `{}`",
        unit.key,
        settings.defines.len(),
        settings.options.len(),
        libraries.len(),
        settings.build_out_dir
    );

    Ok(ResolvedJob::new(
        descriptor.project.clone(),
        unit.key.clone(),
        settings,
        libraries,
        descriptor.root.clone(),
    ))
}
