//! Scalar values carried by `variables` and `options`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A variable or option value.
///
/// Booleans render as CMake `ON`/`OFF`; everything else renders verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    String(String),
}

/// Shape of a [`ConfigValue`], used to detect type-changing overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Integer,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "boolean"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::String => write!(f, "string"),
        }
    }
}

impl ConfigValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Integer(_) => ValueKind::Integer,
            ConfigValue::String(_) => ValueKind::String,
        }
    }

    /// Render as a CMake argument value.
    pub fn to_cmake(&self) -> String {
        match self {
            ConfigValue::Bool(true) => "ON".to_string(),
            ConfigValue::Bool(false) => "OFF".to_string(),
            ConfigValue::Integer(n) => n.to_string(),
            ConfigValue::String(s) => s.clone(),
        }
    }

    /// CMake cache type for `-D<name>:<type>=<value>`.
    pub fn cmake_type(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "BOOL",
            ConfigValue::Integer(_) | ConfigValue::String(_) => "STRING",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(n) => write!(f, "{}", n),
            ConfigValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Integer(n)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}
