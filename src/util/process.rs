//! Subprocess execution utilities.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// Builder for a captured subprocess.
///
/// Arguments are stored as strings so the same builder can be executed or
/// printed verbatim for a dry run.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string_lossy().into_owned()));
        self
    }

    /// Set an environment variable for the child only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Run to completion with stdout and stderr captured.
    pub fn exec(&self) -> Result<Output> {
        Command::new(&self.program)
            .args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))
    }

    /// Run and require a zero exit status.
    pub fn exec_and_check(&self) -> Result<Output> {
        let output = self.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` failed with exit code {:?}\n{}",
                self.display_command(),
                output.status.code(),
                stderr.trim_end()
            );
        }
        Ok(output)
    }

    /// Shell-like rendering, environment first, for logs and dry runs.
    pub fn display_command(&self) -> String {
        let env = self.env.iter().map(|(k, v)| format!("{}={}", k, shell_word(v)));
        let program = std::iter::once(shell_word(&self.program.to_string_lossy()));
        let args = self.args.iter().map(|a| shell_word(a));

        env.chain(program).chain(args).collect::<Vec<_>>().join(" ")
    }
}

/// Quote a word only when it would otherwise split.
fn shell_word(word: &str) -> String {
    if word.is_empty() || word.contains(char::is_whitespace) {
        format!("\"{}\"", word.replace('"', "\\\""))
    } else {
        word.to_string()
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find CMake, preferring an explicitly configured program.
///
/// A configured path is trusted as is; a bare name is looked up in PATH.
pub fn find_cmake(configured: Option<&Path>) -> Option<PathBuf> {
    match configured {
        Some(path) if path.components().count() > 1 => Some(path.to_path_buf()),
        Some(name) => find_executable(&name.to_string_lossy()),
        None => find_executable("cmake"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_exec_passes_env() {
        let output = ProcessBuilder::new("sh")
            .args(["-c", "echo $XBUILD_PROBE"])
            .env("XBUILD_PROBE", "hello")
            .exec()
            .unwrap();

        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_and_check_reports_failure() {
        let err = ProcessBuilder::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .exec_and_check()
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Some(3)"));
        assert!(message.contains("broken"));
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("cmake").args(["--build", "build/linux/x64", "--config", "Release"]);
        assert_eq!(pb.display_command(), "cmake --build build/linux/x64 --config Release");

        let pb = ProcessBuilder::new("cmake")
            .args(["-G", "Visual Studio 17 2022"])
            .env("ANDROID_NDK_ROOT", "/opt/ndk");
        assert_eq!(
            pb.display_command(),
            "ANDROID_NDK_ROOT=/opt/ndk cmake -G \"Visual Studio 17 2022\""
        );
        assert_eq!(pb.get_env("ANDROID_NDK_ROOT"), Some("/opt/ndk"));
    }

    #[test]
    fn test_find_cmake_configured_path() {
        let path = Path::new("/opt/cmake/bin/cmake");
        assert_eq!(find_cmake(Some(path)), Some(path.to_path_buf()));
    }
}
