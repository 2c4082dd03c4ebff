//! CLI integration tests for xbuild.
//!
//! These tests drive the binary end to end without requiring CMake: plans,
//! checks, project initialization and dry-run builds.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the xbuild binary command.
fn xbuild() -> Command {
    let mut cmd = Command::cargo_bin("xbuild").unwrap();
    cmd.env_remove("XBUILD_DESCRIPTOR");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write_descriptor(dir: &Path, content: &str) {
    fs::write(dir.join("xbuild.toml"), content).unwrap();
}

const TINYCTHREAD: &str = r#"
[common]
project = "tinycthread"
archs = ["x64"]
options = [
    ["TINYCTHREAD_DISABLE_TESTS", true],
    ["TINYCTHREAD_INSTALL", false],
]
subdirectories = ["tinycthread"]
buildDir = "build"
buildOutDir = "../libs"

[common.libraries.tinycthread]

[platforms.win32.windows]

[platforms.win32.android]
archs = ["x86", "x86_64", "armeabi-v7a", "arm64-v8a"]

[platforms.linux.linux]

[platforms.darwin.macos]
"#;

const LINUX_ONLY: &str = r#"
[common]
project = "demo"
archs = ["x64"]
subdirectories = ["demo"]
buildFlags = ["-DDEMO_SHARED=ON"]

[platforms.linux.linux]
"#;

// ============================================================================
// xbuild plan
// ============================================================================

#[test]
fn test_plan_prints_table() {
    let tmp = temp_dir();
    write_descriptor(tmp.path(), TINYCTHREAD);

    xbuild()
        .arg("plan")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("win32/android/arm64-v8a"))
        .stdout(predicate::str::contains("darwin/macos/x64"))
        .stderr(predicate::str::contains("7 job(s)"));
}

#[test]
fn test_plan_json() {
    let tmp = temp_dir();
    write_descriptor(tmp.path(), TINYCTHREAD);

    let output = xbuild()
        .args(["plan", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["project"], "tinycthread");
    let jobs = plan["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 7);
    assert_eq!(jobs[0]["platform"], "win32");
    assert_eq!(jobs[0]["os"], "windows");
    assert_eq!(jobs[0]["buildOutDir"], "../libs");
}

#[test]
fn test_plan_filter() {
    let tmp = temp_dir();
    write_descriptor(tmp.path(), TINYCTHREAD);

    let output = xbuild()
        .args(["plan", "--json", "--os", "android"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let archs: Vec<_> = plan["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["arch"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(archs, ["x86", "x86_64", "armeabi-v7a", "arm64-v8a"]);
}

#[test]
fn test_plan_with_explicit_descriptor() {
    let tmp = temp_dir();
    let nested = tmp.path().join("config");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("demo.toml"), LINUX_ONLY).unwrap();

    xbuild()
        .args(["plan", "--descriptor", "config/demo.toml"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("linux/linux/x64"));
}

#[test]
fn test_plan_without_descriptor_fails() {
    let tmp = temp_dir();

    xbuild()
        .arg("plan")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `xbuild.toml`"))
        .stderr(predicate::str::contains("xbuild init"));
}

// ============================================================================
// xbuild check
// ============================================================================

#[test]
fn test_check_valid_descriptor() {
    let tmp = temp_dir();
    write_descriptor(tmp.path(), TINYCTHREAD);

    xbuild()
        .arg("check")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("7 job(s)"));
}

#[test]
fn test_check_json_alias() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("xbuild.json"),
        r#"{
  "common": { "project": "demo", "archs": ["x64"] },
  "platforms": { "linux": { "linux": {} }, "darwin": { "macos": {} } }
}"#,
    )
    .unwrap();

    xbuild()
        .arg("check")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("2 job(s)"));
}

#[test]
fn test_check_duplicate_job() {
    let tmp = temp_dir();
    write_descriptor(
        tmp.path(),
        r#"
[common]
project = "demo"

[platforms.win32.android]
archs = ["arm64-v8a"]

[platforms.linux.android]
archs = ["arm64-v8a"]
"#,
    );

    xbuild()
        .args(["check", "--no-color"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "both write android/arm64-v8a into `libs`",
        ))
        .stderr(predicate::str::contains("duplicate job"));
}

#[test]
fn test_check_empty_archs() {
    let tmp = temp_dir();
    write_descriptor(
        tmp.path(),
        r#"
[common]
project = "demo"

[platforms.linux.linux]
archs = []
"#,
    );

    xbuild()
        .args(["check", "--no-color"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty architecture list for linux/linux"));
}

#[test]
fn test_check_unknown_platform() {
    let tmp = temp_dir();
    write_descriptor(
        tmp.path(),
        r#"
[common]
project = "demo"

[platforms.beos.linux]
"#,
    );

    xbuild()
        .args(["check", "--no-color"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown platform `beos`"))
        .stderr(predicate::str::contains("known platforms: win32, linux, darwin"));
}

#[test]
fn test_check_platform_without_targets() {
    let tmp = temp_dir();
    write_descriptor(
        tmp.path(),
        r#"
[common]
project = "demo"

[platforms.linux]
"#,
    );

    xbuild()
        .args(["check", "--no-color"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("platform `linux` at `platforms.linux` declares no target OS"))
        .stderr(predicate::str::contains("matrix error"));
}

#[test]
fn test_check_unknown_library() {
    let tmp = temp_dir();
    write_descriptor(
        tmp.path(),
        r#"
[common]
project = "demo"
archs = ["x64"]

[platforms.linux.linux.libraries.missing]
defines = ["X"]
"#,
    );

    xbuild()
        .args(["check", "--no-color"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("library `missing`"));
}

// ============================================================================
// xbuild init
// ============================================================================

#[test]
fn test_init_creates_descriptor() {
    let tmp = temp_dir();

    xbuild()
        .args(["init", "--name", "mylib"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let descriptor = fs::read_to_string(tmp.path().join("xbuild.toml")).unwrap();
    assert!(descriptor.contains("project = \"mylib\""));

    // The generated descriptor resolves
    xbuild()
        .arg("check")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("3 job(s)"));
}

#[test]
fn test_init_fails_if_descriptor_exists() {
    let tmp = temp_dir();

    xbuild()
        .args(["init", "--name", "demo"])
        .current_dir(tmp.path())
        .assert()
        .success();

    xbuild()
        .args(["init", "--name", "demo"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ============================================================================
// xbuild build
// ============================================================================

#[test]
fn test_build_dry_run() {
    let tmp = temp_dir();
    write_descriptor(tmp.path(), LINUX_ONLY);

    xbuild()
        .args(["build", "--dry-run", "-G", "Ninja"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("# linux/linux/x64"))
        .stdout(predicate::str::contains("-G Ninja"))
        .stdout(predicate::str::contains("-DDEMO_SHARED=ON"))
        .stdout(predicate::str::contains("--build"));

    assert!(!tmp.path().join("build").exists());
}

#[test]
fn test_build_filter_matching_nothing() {
    let tmp = temp_dir();
    write_descriptor(tmp.path(), LINUX_ONLY);

    xbuild()
        .args(["build", "--dry-run", "--os", "ios"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no jobs match"));
}

// ============================================================================
// xbuild completions
// ============================================================================

#[test]
fn test_completions_bash() {
    xbuild()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("xbuild"));
}

#[test]
fn test_help_lists_commands() {
    xbuild()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("build"));
}
