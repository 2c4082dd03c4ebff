//! Platform families, target operating systems and architectures.
//!
//! Families and OSes are closed sets: a descriptor key outside them is an
//! error, never silently ignored. Architectures are open identifiers since
//! every toolchain spells them differently (`x64`, `arm64-v8a`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Host family that drives a group of target OS builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Win32,
    Linux,
    Darwin,
}

impl PlatformFamily {
    /// All known families, in canonical order.
    pub const ALL: [PlatformFamily; 3] = [
        PlatformFamily::Win32,
        PlatformFamily::Linux,
        PlatformFamily::Darwin,
    ];

    /// Descriptor key for this family.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFamily::Win32 => "win32",
            PlatformFamily::Linux => "linux",
            PlatformFamily::Darwin => "darwin",
        }
    }

    /// Comma-separated list of accepted keys, for error messages.
    pub fn known_keys() -> String {
        Self::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformFamily {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win32" => Ok(PlatformFamily::Win32),
            "linux" => Ok(PlatformFamily::Linux),
            "darwin" => Ok(PlatformFamily::Darwin),
            _ => Err(UnknownKey(s.to_string())),
        }
    }
}

/// Operating system a job produces binaries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Windows,
    Android,
    Linux,
    Macos,
    Ios,
}

impl TargetOs {
    pub const ALL: [TargetOs; 5] = [
        TargetOs::Windows,
        TargetOs::Android,
        TargetOs::Linux,
        TargetOs::Macos,
        TargetOs::Ios,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetOs::Windows => "windows",
            TargetOs::Android => "android",
            TargetOs::Linux => "linux",
            TargetOs::Macos => "macos",
            TargetOs::Ios => "ios",
        }
    }

    pub fn known_keys() -> String {
        Self::ALL
            .iter()
            .map(|os| os.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The architecture used when neither the target nor `common` lists any.
    ///
    /// Desktop OSes build for the host CPU; mobile OSes use the dominant
    /// device ABI.
    pub fn default_arch(&self) -> Arch {
        match self {
            TargetOs::Android => Arch::new("arm64-v8a"),
            TargetOs::Ios => Arch::new("arm64"),
            TargetOs::Windows | TargetOs::Linux | TargetOs::Macos => Arch::host(),
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetOs {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "windows" => Ok(TargetOs::Windows),
            "android" => Ok(TargetOs::Android),
            "linux" => Ok(TargetOs::Linux),
            "macos" => Ok(TargetOs::Macos),
            "ios" => Ok(TargetOs::Ios),
            _ => Err(UnknownKey(s.to_string())),
        }
    }
}

/// A key that is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key `{}`", self.0)
    }
}

impl std::error::Error for UnknownKey {}

/// CPU architecture identifier, spelled the way the descriptor spells it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arch(String);

impl Arch {
    pub fn new(name: impl Into<String>) -> Self {
        Arch(name.into())
    }

    /// The host CPU in descriptor vocabulary.
    pub fn host() -> Self {
        Arch::from_rust_arch(std::env::consts::ARCH)
    }

    /// Map a Rust `target_arch` name to descriptor vocabulary.
    pub fn from_rust_arch(arch: &str) -> Self {
        match arch {
            "x86_64" => Arch::new("x64"),
            "x86" => Arch::new("x86"),
            "aarch64" => Arch::new("arm64"),
            "arm" => Arch::new("arm"),
            other => Arch::new(other),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Arch {
    fn from(s: &str) -> Self {
        Arch::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_roundtrip_keys() {
        for family in PlatformFamily::ALL {
            assert_eq!(family.as_str().parse::<PlatformFamily>().unwrap(), family);
        }
        assert!("windows".parse::<PlatformFamily>().is_err());
    }

    #[test]
    fn test_target_os_parse() {
        assert_eq!("android".parse::<TargetOs>().unwrap(), TargetOs::Android);
        let err = "haiku".parse::<TargetOs>().unwrap_err();
        assert_eq!(err.to_string(), "unknown key `haiku`");
    }

    #[test]
    fn test_default_arch() {
        assert_eq!(TargetOs::Android.default_arch(), Arch::new("arm64-v8a"));
        assert_eq!(TargetOs::Ios.default_arch(), Arch::new("arm64"));
        assert_eq!(TargetOs::Windows.default_arch(), Arch::host());
    }

    #[test]
    fn test_rust_arch_mapping() {
        assert_eq!(Arch::from_rust_arch("x86_64").as_str(), "x64");
        assert_eq!(Arch::from_rust_arch("aarch64").as_str(), "arm64");
        assert_eq!(Arch::from_rust_arch("riscv64").as_str(), "riscv64");
    }

    #[test]
    fn test_known_keys_listing() {
        assert_eq!(PlatformFamily::known_keys(), "win32, linux, darwin");
        assert!(TargetOs::known_keys().contains("android"));
    }
}
