//! Configuration file support for xbuild.
//!
//! xbuild reads two configuration file locations:
//! - Global: `~/.xbuild/config.toml` - User-wide defaults
//! - Project: `.xbuild/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Android API level used when none is configured.
pub const DEFAULT_ANDROID_API_LEVEL: u32 = 21;

/// xbuild configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CMake invocation settings
    pub cmake: CMakeConfig,

    /// Build scheduling settings
    pub build: BuildConfig,

    /// Android NDK settings
    pub android: AndroidConfig,

    /// Apple platform settings
    pub apple: AppleConfig,
}

/// CMake invocation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CMakeConfig {
    /// Path to the cmake executable (None = search PATH)
    pub program: Option<PathBuf>,

    /// Generator passed with `-G` (e.g. "Ninja", "Visual Studio 17 2022")
    pub generator: Option<String>,

    /// Extra arguments appended to every configure step
    pub extra_args: Vec<String>,
}

/// Build scheduling settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Number of jobs built in parallel (None = one at a time)
    pub jobs: Option<usize>,

    /// Keep building remaining jobs after a failure
    pub keep_going: Option<bool>,
}

impl BuildConfig {
    pub fn keep_going(&self) -> bool {
        self.keep_going.unwrap_or(false)
    }
}

/// Android NDK settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    /// NDK root directory
    pub ndk: Option<PathBuf>,

    /// Minimum API level (`ANDROID_PLATFORM=android-<level>`)
    pub api_level: Option<u32>,
}

impl AndroidConfig {
    /// Configured NDK root, falling back to `ANDROID_NDK_ROOT` then `ANDROID_NDK_HOME`.
    pub fn ndk_root(&self) -> Option<PathBuf> {
        self.ndk.clone().or_else(|| {
            ["ANDROID_NDK_ROOT", "ANDROID_NDK_HOME"]
                .iter()
                .filter_map(|var| std::env::var_os(var))
                .find(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }

    pub fn api_level(&self) -> u32 {
        self.api_level.unwrap_or(DEFAULT_ANDROID_API_LEVEL)
    }
}

/// Apple platform settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppleConfig {
    /// `CMAKE_OSX_DEPLOYMENT_TARGET` for macOS and iOS jobs
    pub deployment_target: Option<String>,
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

impl Config {
    /// Read and parse one config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Like [`Config::load`], but a missing or broken file yields defaults.
    ///
    /// A broken file is reported with a warning rather than failing the command.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.is_file() {
            return Config::default();
        }
        match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring {}: {:#}", path.display(), e);
                Config::default()
            }
        }
    }

    /// Layer `other` on top of `self`. Values set in `other` win.
    pub fn merge(&mut self, other: Config) {
        let Config {
            cmake,
            build,
            android,
            apple,
        } = other;

        overlay(&mut self.cmake.program, cmake.program);
        overlay(&mut self.cmake.generator, cmake.generator);
        if !cmake.extra_args.is_empty() {
            self.cmake.extra_args = cmake.extra_args;
        }

        overlay(&mut self.build.jobs, build.jobs);
        overlay(&mut self.build.keep_going, build.keep_going);

        overlay(&mut self.android.ndk, android.ndk);
        overlay(&mut self.android.api_level, android.api_level);

        overlay(&mut self.apple.deployment_target, apple.deployment_target);
    }
}

/// Defaults, then the global file, then the project file.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = global_path.map(Config::load_or_default).unwrap_or_default();
    config.merge(Config::load_or_default(project_path));
    config
}

/// Get the global xbuild config directory (~/.xbuild).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".xbuild"))
}

/// Get the project config path (.xbuild/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".xbuild").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.cmake.program.is_none());
        assert!(config.build.jobs.is_none());
        assert!(!config.build.keep_going());
        assert_eq!(config.android.api_level(), DEFAULT_ANDROID_API_LEVEL);
    }

    #[test]
    fn test_load_all_sections() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        std::fs::write(
            &path,
            r#"
[cmake]
generator = "Ninja"
extra_args = ["-DCMAKE_BUILD_TYPE=Release"]

[build]
jobs = 4
keep_going = true

[android]
ndk = "/opt/android-ndk"
api_level = 24

[apple]
deployment_target = "11.0"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.cmake.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.cmake.extra_args, vec!["-DCMAKE_BUILD_TYPE=Release"]);
        assert_eq!(config.build.jobs, Some(4));
        assert!(config.build.keep_going());
        assert_eq!(config.android.ndk_root(), Some(PathBuf::from("/opt/android-ndk")));
        assert_eq!(config.android.api_level(), 24);
        assert_eq!(config.apple.deployment_target.as_deref(), Some("11.0"));
    }

    #[test]
    fn test_merge_keeps_unset_values() {
        let mut global = Config::default();
        global.cmake.generator = Some("Unix Makefiles".to_string());
        global.build.jobs = Some(2);

        let mut project = Config::default();
        project.cmake.generator = Some("Ninja".to_string());

        global.merge(project);

        assert_eq!(global.cmake.generator.as_deref(), Some("Ninja"));
        assert_eq!(global.build.jobs, Some(2));
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[build]
jobs = 8
keep_going = true

[android]
api_level = 23
"#,
        )
        .unwrap();
        std::fs::write(
            &project_path,
            r#"
[build]
keep_going = false

[android]
api_level = 28
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path);
        assert_eq!(config.build.jobs, Some(8));
        assert!(!config.build.keep_going());
        assert_eq!(config.android.api_level(), 28);
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[build]\njobs = \"many\"\n").unwrap();

        assert!(Config::load(&path).is_err());
        assert!(Config::load_or_default(&path).build.jobs.is_none());
    }
}
