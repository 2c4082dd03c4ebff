//! Build descriptor parsing and schema.
//!
//! The descriptor is the declarative input: a `common` baseline plus
//! per-family, per-OS overrides. Supports both `xbuild.toml` (canonical) and
//! `xbuild.json` (alias).
//!
//! Both encodings are decoded into an order-preserving value tree first and
//! converted field by field, so that every error carries the path of the
//! offending fragment and declaration order survives into the job matrix.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::platform::{Arch, PlatformFamily, TargetOs};
use crate::core::value::ConfigValue;
use crate::resolver::errors::ResolveError;
use crate::resolver::merge::check_template;

/// Overridable settings shared by the common, target and library layers.
///
/// Collections that are absent from the input are empty; scalars that are
/// absent are `None` so a layer never clobbers a value it did not declare.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Cache variables, merged by name
    pub variables: IndexMap<String, ConfigValue>,

    /// Preprocessor definitions, concatenated
    pub defines: Vec<String>,

    /// Option toggles, merged by name
    pub options: IndexMap<String, ConfigValue>,

    /// Copy rules (source -> destination), merged by source
    pub copy: IndexMap<String, String>,

    /// Build units added with `add_subdirectory`, concatenated
    pub subdirectories: Vec<String>,

    /// Build directory, replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<String>,

    /// Output directory, replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_out_dir: Option<String>,

    /// Raw flags passed to the configure step, concatenated
    pub build_flags: Vec<String>,
}

/// The baseline every job starts from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonConfig {
    /// Descriptor-wide default architectures
    pub archs: Option<Vec<Arch>>,

    pub settings: Layer,

    /// Declared libraries and their baseline settings
    pub libraries: IndexMap<String, Layer>,
}

/// Overrides for one target OS.
///
/// An empty config inherits everything from [`CommonConfig`]. A present
/// `archs` replaces the common default rather than extending it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetConfig {
    pub archs: Option<Vec<Arch>>,

    pub settings: Layer,

    /// Per-library overrides; names must be declared in `common.libraries`
    pub libraries: IndexMap<String, Layer>,
}

/// Target OSes nested under one platform family, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformConfig {
    pub targets: IndexMap<TargetOs, TargetConfig>,
}

/// The parsed build descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildDescriptor {
    /// Project name
    pub project: String,

    pub common: CommonConfig,

    /// Platform families in declaration order
    pub platforms: IndexMap<PlatformFamily, PlatformConfig>,

    /// Directory containing the descriptor; relative paths resolve here
    pub root: PathBuf,
}

/// Canonical descriptor file name.
pub const DESCRIPTOR_NAME: &str = "xbuild.toml";

/// JSON alias for the descriptor file.
pub const DESCRIPTOR_ALIAS: &str = "xbuild.json";

impl BuildDescriptor {
    /// Create an empty descriptor for a project.
    pub fn new(project: impl Into<String>) -> Self {
        BuildDescriptor {
            project: project.into(),
            common: CommonConfig::default(),
            platforms: IndexMap::new(),
            root: PathBuf::from("."),
        }
    }

    /// Load a descriptor from a file, choosing the decoder by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read descriptor: {}", path.display()))?;

        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let descriptor = if is_json {
            Self::parse_json(&content)
        } else {
            Self::parse_toml(&content)
        }
        .with_context(|| format!("invalid descriptor: {}", path.display()))?;

        let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(descriptor.with_root(root))
    }

    /// Parse TOML descriptor content.
    pub fn parse_toml(content: &str) -> Result<Self, ResolveError> {
        let value: Value = toml::from_str(content).map_err(|e| ResolveError::Schema {
            path: String::new(),
            message: format!("failed to parse TOML: {}", e.message()),
        })?;
        Self::from_value(&value)
    }

    /// Parse JSON descriptor content.
    pub fn parse_json(content: &str) -> Result<Self, ResolveError> {
        let value: Value = serde_json::from_str(content).map_err(|e| ResolveError::Schema {
            path: String::new(),
            message: format!("failed to parse JSON: {}", e),
        })?;
        Self::from_value(&value)
    }

    /// Set the directory relative paths resolve against.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Convert a decoded value tree into a descriptor.
    pub fn from_value(value: &Value) -> Result<Self, ResolveError> {
        let root = expect_object(value, "")?;

        for key in root.keys() {
            if !matches!(key.as_str(), "project" | "common" | "platforms") {
                return Err(ResolveError::Schema {
                    path: key.clone(),
                    message: "unknown top-level field".to_string(),
                });
            }
        }

        let empty = Map::new();
        let common_obj = match root.get("common") {
            Some(v) => expect_object(v, "common")?,
            None => &empty,
        };

        let project = resolve_project(root.get("project"), common_obj.get("project"))?;
        let common = parse_common(common_obj)?;

        let platforms_value = root.get("platforms").ok_or_else(|| ResolveError::Schema {
            path: "platforms".to_string(),
            message: "at least one platform must be declared".to_string(),
        })?;
        let platforms_obj = expect_object(platforms_value, "platforms")?;
        if platforms_obj.is_empty() {
            return Err(ResolveError::Schema {
                path: "platforms".to_string(),
                message: "at least one platform must be declared".to_string(),
            });
        }

        let mut platforms = IndexMap::new();
        for (family_key, family_value) in platforms_obj {
            let family_path = child("platforms", family_key);
            let family = crate::resolver::validate::check_platform_key(family_key, &family_path)?;
            let platform = parse_platform(family_value, &family_path, common_obj)?;
            platforms.insert(family, platform);
        }

        Ok(BuildDescriptor {
            project,
            common,
            platforms,
            root: PathBuf::from("."),
        })
    }

    /// Number of target OS entries across all families.
    pub fn target_count(&self) -> usize {
        self.platforms.values().map(|p| p.targets.len()).sum()
    }
}

fn resolve_project(root: Option<&Value>, common: Option<&Value>) -> Result<String, ResolveError> {
    let root = root.map(|v| expect_string(v, "project")).transpose()?;
    let common = common
        .map(|v| expect_string(v, "common.project"))
        .transpose()?;

    match (root, common) {
        (Some(a), Some(b)) if a != b => Err(ResolveError::Schema {
            path: "common.project".to_string(),
            message: format!("project name `{}` disagrees with top-level `{}`", b, a),
        }),
        (Some(name), _) | (None, Some(name)) if !name.is_empty() => Ok(name.to_string()),
        (Some(_), _) | (None, Some(_)) => Err(ResolveError::Schema {
            path: "project".to_string(),
            message: "project name must not be empty".to_string(),
        }),
        (None, None) => Err(ResolveError::Schema {
            path: "project".to_string(),
            message: "missing project name".to_string(),
        }),
    }
}

fn parse_common(obj: &Map<String, Value>) -> Result<CommonConfig, ResolveError> {
    let parsed = parse_layer(obj, "common", Scope::Common, &[])?;
    Ok(CommonConfig {
        archs: parsed.archs,
        settings: parsed.settings,
        libraries: parsed.libraries,
    })
}

fn parse_platform(
    value: &Value,
    path: &str,
    common: &Map<String, Value>,
) -> Result<PlatformConfig, ResolveError> {
    let obj = expect_object(value, path)?;
    let mut targets = IndexMap::new();

    for (os_key, target_value) in obj {
        let os_path = child(path, os_key);
        let os: TargetOs = os_key
            .parse()
            .map_err(|_| ResolveError::UnknownTargetOs {
                key: os_key.clone(),
                path: os_path.clone(),
            })?;
        let target_obj = expect_object(target_value, &os_path)?;
        let parsed = parse_layer(target_obj, &os_path, Scope::Target, &[common])?;
        targets.insert(
            os,
            TargetConfig {
                archs: parsed.archs,
                settings: parsed.settings,
                libraries: parsed.libraries,
            },
        );
    }

    Ok(PlatformConfig { targets })
}

/// Where a layer appears; decides which fields it may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Common,
    Target,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Project,
    Archs,
    Variables,
    Defines,
    Options,
    Copy,
    Subdirectories,
    Libraries,
    BuildDir,
    BuildOutDir,
    BuildFlags,
}

/// The value shape a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    String,
    Array,
    Object,
    /// Ordered `[name, value]` pairs or a table
    Keyed,
}

impl Field {
    fn from_key(key: &str) -> Option<Field> {
        match key {
            "project" => Some(Field::Project),
            "archs" => Some(Field::Archs),
            "variables" => Some(Field::Variables),
            "defines" => Some(Field::Defines),
            "options" => Some(Field::Options),
            "copy" => Some(Field::Copy),
            "subdirectories" => Some(Field::Subdirectories),
            "libraries" => Some(Field::Libraries),
            "buildDir" | "build_dir" => Some(Field::BuildDir),
            "buildOutDir" | "build_out_dir" => Some(Field::BuildOutDir),
            "buildFlags" | "build_flags" => Some(Field::BuildFlags),
            _ => None,
        }
    }

    fn shape(self) -> Shape {
        match self {
            Field::Project | Field::BuildDir | Field::BuildOutDir => Shape::String,
            Field::Archs | Field::Defines | Field::Subdirectories | Field::BuildFlags => {
                Shape::Array
            }
            Field::Copy | Field::Libraries => Shape::Object,
            Field::Variables | Field::Options => Shape::Keyed,
        }
    }

    fn allowed_in(self, scope: Scope) -> bool {
        match self {
            Field::Project => scope == Scope::Common,
            Field::Archs | Field::Libraries => scope != Scope::Library,
            _ => true,
        }
    }
}

impl Shape {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Shape::String => value.is_string(),
            Shape::Array => value.is_array(),
            Shape::Object => value.is_object(),
            Shape::Keyed => value.is_array() || value.is_object(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::Array => "array",
            Shape::Object => "table",
            Shape::Keyed => "array of [name, value] pairs or table",
        }
    }
}

/// Human name for the shape of a decoded value.
fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

struct ParsedLayer {
    archs: Option<Vec<Arch>>,
    settings: Layer,
    libraries: IndexMap<String, Layer>,
}

/// Parse one layer object.
///
/// `baselines` are the layers this one overrides, nearest first. A field whose
/// shape differs from the nearest baseline declaring it is a merge type
/// conflict rather than a plain schema error, since it tries to replace one
/// kind of value with another.
fn parse_layer(
    obj: &Map<String, Value>,
    path: &str,
    scope: Scope,
    baselines: &[&Map<String, Value>],
) -> Result<ParsedLayer, ResolveError> {
    let mut parsed = ParsedLayer {
        archs: None,
        settings: Layer::default(),
        libraries: IndexMap::new(),
    };

    for (key, value) in obj {
        let field_path = child(path, key);
        let field = Field::from_key(key)
            .filter(|f| f.allowed_in(scope))
            .ok_or_else(|| ResolveError::Schema {
                path: field_path.clone(),
                message: format!("unknown field `{}`", key),
            })?;

        if !field.shape().accepts(value) {
            let base_value = baselines.iter().find_map(|b| lookup_field(b, field));
            return Err(match base_value {
                Some(base) if field.shape().accepts(base) => ResolveError::MergeTypeConflict {
                    path: field_path,
                    expected: shape_name(base).to_string(),
                    found: shape_name(value).to_string(),
                },
                _ => ResolveError::Schema {
                    path: field_path,
                    message: format!(
                        "expected {}, found {}",
                        field.shape().describe(),
                        shape_name(value)
                    ),
                },
            });
        }

        let settings = &mut parsed.settings;
        match field {
            // Validated and consumed by the caller
            Field::Project => {}
            Field::Archs => parsed.archs = Some(parse_archs(value, &field_path)?),
            Field::Variables => settings.variables = parse_keyed(value, &field_path)?,
            Field::Options => settings.options = parse_keyed(value, &field_path)?,
            Field::Defines => settings.defines = parse_strings(value, &field_path)?,
            Field::Subdirectories => settings.subdirectories = parse_strings(value, &field_path)?,
            Field::BuildFlags => settings.build_flags = parse_strings(value, &field_path)?,
            Field::BuildDir => settings.build_dir = Some(parse_template(value, &field_path)?),
            Field::BuildOutDir => {
                settings.build_out_dir = Some(parse_template(value, &field_path)?)
            }
            Field::Copy => settings.copy = parse_copy(value, &field_path)?,
            Field::Libraries => {
                let libs = expect_object(value, &field_path)?;
                for (name, lib_value) in libs {
                    let lib_path = child(&field_path, name);
                    let lib_obj = expect_object(lib_value, &lib_path)?;
                    // A declared library sits on the layer it is declared in.
                    // An override sits on the declared library, then on the
                    // job layer underneath it.
                    let declared = baselines
                        .first()
                        .and_then(|b| b.get("libraries"))
                        .and_then(Value::as_object)
                        .and_then(|l| l.get(name))
                        .and_then(Value::as_object);
                    let lib_baselines: Vec<&Map<String, Value>> = match scope {
                        Scope::Common => vec![obj],
                        _ => declared
                            .into_iter()
                            .chain(std::iter::once(obj))
                            .chain(baselines.iter().copied())
                            .collect(),
                    };
                    let lib = parse_layer(lib_obj, &lib_path, Scope::Library, &lib_baselines)?;
                    parsed.libraries.insert(name.clone(), lib.settings);
                }
            }
        }
    }

    Ok(parsed)
}

fn lookup_field(obj: &Map<String, Value>, field: Field) -> Option<&Value> {
    obj.iter()
        .find(|(k, _)| Field::from_key(k) == Some(field))
        .map(|(_, v)| v)
}

fn parse_archs(value: &Value, path: &str) -> Result<Vec<Arch>, ResolveError> {
    let names = parse_strings(value, path)?;
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if name.trim().is_empty() {
                Err(ResolveError::Schema {
                    path: format!("{}[{}]", path, i),
                    message: "architecture name must not be empty".to_string(),
                })
            } else {
                Ok(Arch::new(name))
            }
        })
        .collect()
}

fn parse_template(value: &Value, path: &str) -> Result<String, ResolveError> {
    let template = expect_string(value, path)?;
    check_template(template, path)?;
    Ok(template.to_string())
}

fn parse_strings(value: &Value, path: &str) -> Result<Vec<String>, ResolveError> {
    let items = value.as_array().ok_or_else(|| ResolveError::Schema {
        path: path.to_string(),
        message: format!("expected array, found {}", shape_name(value)),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| expect_string(item, &format!("{}[{}]", path, i)).map(str::to_string))
        .collect()
}

fn parse_copy(value: &Value, path: &str) -> Result<IndexMap<String, String>, ResolveError> {
    let obj = expect_object(value, path)?;
    obj.iter()
        .map(|(src, dst)| {
            let dst = expect_string(dst, &child(path, src))?;
            Ok((src.clone(), dst.to_string()))
        })
        .collect()
}

/// Parse `[[name, value], ...]` or `{ name = value }` into an ordered map.
///
/// A name repeated within one layer keeps its first position and its last value.
fn parse_keyed(value: &Value, path: &str) -> Result<IndexMap<String, ConfigValue>, ResolveError> {
    let mut out = IndexMap::new();

    match value {
        Value::Array(pairs) => {
            for (i, pair) in pairs.iter().enumerate() {
                let pair_path = format!("{}[{}]", path, i);
                let items = pair
                    .as_array()
                    .filter(|items| items.len() == 2)
                    .ok_or_else(|| ResolveError::Schema {
                        path: pair_path.clone(),
                        message: "expected a [name, value] pair".to_string(),
                    })?;
                let name = expect_string(&items[0], &format!("{}[0]", pair_path))?;
                let value = parse_scalar(&items[1], &format!("{}[1]", pair_path))?;
                out.insert(name.to_string(), value);
            }
        }
        Value::Object(table) => {
            for (name, v) in table {
                out.insert(name.clone(), parse_scalar(v, &child(path, name))?);
            }
        }
        other => {
            return Err(ResolveError::Schema {
                path: path.to_string(),
                message: format!("expected array or table, found {}", shape_name(other)),
            })
        }
    }

    Ok(out)
}

fn parse_scalar(value: &Value, path: &str) -> Result<ConfigValue, ResolveError> {
    match value {
        Value::Bool(b) => Ok(ConfigValue::Bool(*b)),
        Value::String(s) => Ok(ConfigValue::String(s.clone())),
        Value::Number(n) => n.as_i64().map(ConfigValue::Integer).ok_or_else(|| {
            ResolveError::Schema {
                path: path.to_string(),
                message: format!("`{}` is not an integer", n),
            }
        }),
        other => Err(ResolveError::Schema {
            path: path.to_string(),
            message: format!(
                "expected boolean, integer or string, found {}",
                shape_name(other)
            ),
        }),
    }
}

fn expect_object<'v>(value: &'v Value, path: &str) -> Result<&'v Map<String, Value>, ResolveError> {
    value.as_object().ok_or_else(|| ResolveError::Schema {
        path: path.to_string(),
        message: format!("expected table, found {}", shape_name(value)),
    })
}

fn expect_string<'v>(value: &'v Value, path: &str) -> Result<&'v str, ResolveError> {
    value.as_str().ok_or_else(|| ResolveError::Schema {
        path: path.to_string(),
        message: format!("expected string, found {}", shape_name(value)),
    })
}

/// Join a field path segment.
pub(crate) fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Generate a starter descriptor for a new project.
pub fn generate_default_descriptor(project: &str) -> String {
    format!(
        r#"[common]
project = "{project}"
archs = ["x64"]
variables = []
defines = []
options = []
subdirectories = ["{project}"]
buildDir = "build"
buildOutDir = "libs"
buildFlags = []

[common.copy]

[common.libraries.{project}]

[platforms.win32.windows]

[platforms.linux.linux]

[platforms.darwin.macos]
"#
    )
}
