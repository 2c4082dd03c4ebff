//! Shared descriptor fixtures for unit tests.
//!
//! Only compiled for tests. The tinycthread sample mirrors the descriptor the
//! tool was originally written for: one common baseline, an android target
//! nested under win32 with its own architecture list, and one desktop target
//! per family.

use std::process::ExitStatus;
use std::sync::Mutex;

use anyhow::Result;

use crate::builder::BuildInvoker;
use crate::core::job::ResolvedJob;

/// The reference descriptor, in TOML.
pub const TINYCTHREAD_TOML: &str = r#"
[common]
project = "tinycthread"
archs = ["x64"]
variables = []
defines = []
options = [
    ["TINYCTHREAD_DISABLE_TESTS", true],
    ["TINYCTHREAD_INSTALL", false],
]
subdirectories = ["tinycthread"]
buildDir = "build"
buildOutDir = "../libs"
buildFlags = []

[common.copy]

[common.libraries.tinycthread]

[platforms.win32.windows]

[platforms.win32.android]
archs = ["x86", "x86_64", "armeabi-v7a", "arm64-v8a"]

[platforms.linux.linux]

[platforms.darwin.macos]
"#;

/// A descriptor with no common architecture default.
pub const NO_DEFAULT_ARCH_TOML: &str = r#"
[common]
project = "demo"
defines = ["COMMON"]
subdirectories = ["demo"]
buildDir = "build"
buildOutDir = "out"

[platforms.win32.windows]

[platforms.win32.android]
archs = ["x86", "arm64-v8a"]
"#;

/// Invoker that records jobs instead of running them.
#[derive(Debug, Default)]
pub struct RecordingInvoker {
    pub executed: Mutex<Vec<String>>,
    /// Job labels that should report failure
    pub fail_on: Vec<String>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(label: impl Into<String>) -> Self {
        RecordingInvoker {
            executed: Mutex::new(Vec::new()),
            fail_on: vec![label.into()],
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl BuildInvoker for RecordingInvoker {
    fn execute(&self, job: &ResolvedJob) -> Result<ExitStatus> {
        let label = job.label();
        self.executed.lock().unwrap().push(label.clone());
        let code = if self.fail_on.contains(&label) { 1 } else { 0 };
        Ok(exit_status(code))
    }
}

/// Build an `ExitStatus` from a plain exit code.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}
