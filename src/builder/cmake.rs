//! CMake invoker.
//!
//! Each job gets a generated wrapper `CMakeLists.txt` that applies the
//! resolved variables, options, defines and per-library settings, then pulls
//! in the descriptor's subdirectories. The wrapper lives inside the job's
//! binary directory so concurrent jobs never share files.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{bail, Context, Result};

use crate::builder::BuildInvoker;
use crate::core::job::{ResolvedJob, ResolvedLibrary};
use crate::core::platform::TargetOs;
use crate::core::value::ConfigValue;
use crate::util::config::{AndroidConfig, AppleConfig, Config};
use crate::util::diagnostic::suggestions;
use crate::util::fs::{cmake_path, write_string};
use crate::util::process::ProcessBuilder;

/// Directory (under the binary dir) holding the generated wrapper.
pub const WRAPPER_DIR: &str = "xbuild-wrapper";

/// Configuration built by `cmake --build`.
pub const BUILD_CONFIG: &str = "Release";

/// Drives CMake for resolved jobs.
#[derive(Debug, Clone)]
pub struct CMakeInvoker {
    program: PathBuf,
    generator: Option<String>,
    extra_args: Vec<String>,
    android: AndroidConfig,
    apple: AppleConfig,
}

impl CMakeInvoker {
    /// Create an invoker for a cmake executable with tool configuration.
    pub fn new(program: impl Into<PathBuf>, config: &Config) -> Self {
        CMakeInvoker {
            program: program.into(),
            generator: config.cmake.generator.clone(),
            extra_args: config.cmake.extra_args.clone(),
            android: config.android.clone(),
            apple: config.apple.clone(),
        }
    }

    /// Override the generator.
    pub fn generator(mut self, generator: Option<String>) -> Self {
        if generator.is_some() {
            self.generator = generator;
        }
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Path of the generated wrapper directory for a job.
    pub fn wrapper_dir(job: &ResolvedJob) -> PathBuf {
        job.binary_dir().join(WRAPPER_DIR)
    }

    /// Query `cmake --version`.
    pub fn version(&self) -> Result<String> {
        let output = ProcessBuilder::new(&self.program)
            .arg("--version")
            .exec_and_check()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    /// The configure command for a job.
    pub fn configure_command(&self, job: &ResolvedJob) -> Result<ProcessBuilder> {
        let mut cmd = ProcessBuilder::new(&self.program)
            .arg("-S")
            .arg(Self::wrapper_dir(job))
            .arg("-B")
            .arg(job.binary_dir());

        if let Some(generator) = &self.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        cmd = cmd
            .args(self.toolchain_args(job)?)
            .arg(format!("-DCMAKE_BUILD_TYPE={}", BUILD_CONFIG))
            .args(&self.extra_args)
            .args(&job.settings().build_flags);

        if job.os() == TargetOs::Android {
            if let Some(ndk) = self.android.ndk_root() {
                cmd = cmd.env("ANDROID_NDK_ROOT", ndk.to_string_lossy());
            }
        }

        Ok(cmd)
    }

    /// The build command for a job.
    pub fn build_command(&self, job: &ResolvedJob) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .arg("--build")
            .arg(job.binary_dir())
            .arg("--config")
            .arg(BUILD_CONFIG)
    }

    /// Platform-specific configure arguments.
    pub fn toolchain_args(&self, job: &ResolvedJob) -> Result<Vec<String>> {
        let arch = job.arch().as_str();
        let mut args = Vec::new();

        match job.os() {
            TargetOs::Windows => {
                if self.uses_visual_studio() {
                    args.push("-A".to_string());
                    args.push(msvc_platform(arch).to_string());
                }
            }
            TargetOs::Android => {
                let ndk = self.android.ndk_root().with_context(|| {
                    format!("Android NDK not found for {}\n{}", job.label(), suggestions::NO_NDK)
                })?;
                let toolchain = ndk.join("build").join("cmake").join("android.toolchain.cmake");
                args.push(format!("-DCMAKE_TOOLCHAIN_FILE={}", cmake_path(&toolchain)));
                args.push(format!("-DANDROID_ABI={}", arch));
                args.push(format!("-DANDROID_PLATFORM=android-{}", self.android.api_level()));
            }
            TargetOs::Linux => {
                if arch == "x86" {
                    args.push("-DCMAKE_C_FLAGS=-m32".to_string());
                    args.push("-DCMAKE_CXX_FLAGS=-m32".to_string());
                }
            }
            TargetOs::Macos | TargetOs::Ios => {
                if job.os() == TargetOs::Ios {
                    args.push("-DCMAKE_SYSTEM_NAME=iOS".to_string());
                }
                args.push(format!("-DCMAKE_OSX_ARCHITECTURES={}", apple_arch(arch)));
                if let Some(target) = &self.apple.deployment_target {
                    args.push(format!("-DCMAKE_OSX_DEPLOYMENT_TARGET={}", target));
                }
            }
        }

        Ok(args)
    }

    fn uses_visual_studio(&self) -> bool {
        match &self.generator {
            Some(generator) => generator.starts_with("Visual Studio"),
            None => cfg!(windows),
        }
    }

    /// Commands a job would run, for dry runs.
    pub fn describe(&self, job: &ResolvedJob) -> Result<Vec<String>> {
        Ok(vec![
            self.configure_command(job)?.display_command(),
            self.build_command(job).display_command(),
        ])
    }

    fn run_step(&self, job: &ResolvedJob, step: &str, cmd: &ProcessBuilder) -> Result<ExitStatus> {
        tracing::debug!("{}: {}", job.label(), cmd.display_command());
        let output = cmd.exec()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            tracing::debug!("[{}] {}", job.label(), line);
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                "CMake {} failed for {} ({})\n{}",
                step,
                job.label(),
                output.status,
                stderr.trim_end()
            );
        }

        Ok(output.status)
    }
}

impl BuildInvoker for CMakeInvoker {
    fn execute(&self, job: &ResolvedJob) -> Result<ExitStatus> {
        let wrapper = Self::wrapper_dir(job).join("CMakeLists.txt");
        write_string(&wrapper, &render_wrapper(job))
            .with_context(|| format!("failed to write CMake wrapper for {}", job.label()))?;

        let configure = self.configure_command(job)?;
        let status = self.run_step(job, "configure", &configure)?;
        if !status.success() {
            return Ok(status);
        }

        self.run_step(job, "build", &self.build_command(job))
    }
}

/// Map an architecture to a Visual Studio platform name.
fn msvc_platform(arch: &str) -> &str {
    match arch {
        "x64" | "x86_64" => "x64",
        "x86" => "Win32",
        "arm64" => "ARM64",
        "arm" => "ARM",
        other => other,
    }
}

/// Map an architecture to an Apple `-arch` name.
fn apple_arch(arch: &str) -> &str {
    match arch {
        "x64" => "x86_64",
        other => other,
    }
}

/// Quote a string as a CMake argument.
fn quote(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$");
    format!("\"{}\"", escaped)
}

fn binary_subdir(subdir: &str) -> String {
    subdir
        .replace("..", "up")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Render the wrapper `CMakeLists.txt` for a job.
pub fn render_wrapper(job: &ResolvedJob) -> String {
    let settings = job.settings();
    let out_dir = cmake_path(&job.output_dir());
    let mut out = String::new();

    let _ = writeln!(out, "# Generated by xbuild for {}. Do not edit.", job.label());
    let _ = writeln!(out, "cmake_minimum_required(VERSION 3.15)");
    let _ = writeln!(out, "project({} LANGUAGES C CXX)", quote(job.project()));
    out.push('\n');

    for kind in ["ARCHIVE", "LIBRARY", "RUNTIME"] {
        let _ = writeln!(out, "set(CMAKE_{}_OUTPUT_DIRECTORY {})", kind, quote(&out_dir));
        let _ = writeln!(
            out,
            "set(CMAKE_{}_OUTPUT_DIRECTORY_{} {})",
            kind,
            BUILD_CONFIG.to_uppercase(),
            quote(&out_dir)
        );
    }

    if !settings.variables.is_empty() {
        out.push('\n');
        for (name, value) in &settings.variables {
            let _ = writeln!(out, "set({} {})", name, quote(&value.to_cmake()));
        }
    }

    if !settings.options.is_empty() {
        out.push('\n');
        for (name, value) in &settings.options {
            let _ = writeln!(
                out,
                "set({} {} CACHE {} \"\" FORCE)",
                name,
                quote(&value.to_cmake()),
                value.cmake_type()
            );
        }
    }

    if !settings.defines.is_empty() {
        out.push('\n');
        let defines: Vec<_> = settings.defines.iter().map(|d| quote(d)).collect();
        let _ = writeln!(out, "add_compile_definitions({})", defines.join(" "));
    }

    let mut subdirs: Vec<&String> = settings.subdirectories.iter().collect();
    for lib in job.libraries() {
        for extra in &lib.settings().subdirectories[settings.subdirectories.len()..] {
            if !subdirs.contains(&extra) {
                subdirs.push(extra);
            }
        }
    }
    if !subdirs.is_empty() {
        out.push('\n');
        for subdir in subdirs {
            let source = cmake_path(&job.source_root().join(subdir));
            let _ = writeln!(
                out,
                "add_subdirectory({} {})",
                quote(&source),
                quote(&binary_subdir(subdir))
            );
        }
    }

    for lib in job.libraries() {
        render_library(&mut out, job, lib);
    }

    out
}

/// Emit the settings a library adds on top of its job.
///
/// Library settings always start with the job's own sequences, so only the
/// tail past the job's length is specific to the library.
fn render_library(out: &mut String, job: &ResolvedJob, lib: &ResolvedLibrary) {
    let base = job.settings();
    let settings = lib.settings();
    let name = lib.name();
    let mut body = String::new();

    let defines = &settings.defines[base.defines.len()..];
    if !defines.is_empty() {
        let quoted: Vec<_> = defines.iter().map(|d| quote(d)).collect();
        let _ = writeln!(body, "  target_compile_definitions({} PRIVATE {})", name, quoted.join(" "));
    }

    let flags = &settings.build_flags[base.build_flags.len()..];
    if !flags.is_empty() {
        let quoted: Vec<_> = flags.iter().map(|f| quote(f)).collect();
        let _ = writeln!(body, "  target_compile_options({} PRIVATE {})", name, quoted.join(" "));
    }

    let properties: Vec<(&String, &ConfigValue)> = settings
        .variables
        .iter()
        .chain(&settings.options)
        .filter(|(key, value)| {
            base.variables.get(*key) != Some(*value) && base.options.get(*key) != Some(*value)
        })
        .collect();
    let lib_out = job.output_dir_for(settings);
    let moved_out = settings.build_out_dir != base.build_out_dir;

    if !properties.is_empty() || moved_out {
        let _ = writeln!(body, "  set_target_properties({} PROPERTIES", name);
        for (key, value) in properties {
            let _ = writeln!(body, "    {} {}", key, quote(&value.to_cmake()));
        }
        if moved_out {
            let dir = quote(&cmake_path(&lib_out));
            for kind in ["ARCHIVE", "LIBRARY", "RUNTIME"] {
                let _ = writeln!(body, "    {}_OUTPUT_DIRECTORY {}", kind, dir);
            }
        }
        let _ = writeln!(body, "  )");
    }

    if !body.is_empty() {
        let _ = writeln!(out, "\nif(TARGET {})", name);
        out.push_str(&body);
        let _ = writeln!(out, "endif()");
    }
}

/// Locate cmake for a build, failing with guidance when missing.
pub fn require_cmake(config: &Config) -> Result<PathBuf> {
    match crate::util::process::find_cmake(config.cmake.program.as_deref()) {
        Some(path) => Ok(path),
        None => bail!("CMake not found\n{}", suggestions::NO_CMAKE),
    }
}
