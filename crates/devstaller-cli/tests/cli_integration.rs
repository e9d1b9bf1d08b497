//! CLI subprocess integration tests.
//!
//! These tests invoke the `ckan-devstaller-builder` binary as a subprocess
//! and verify exit codes, stdout content, and JSON output stability.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn builder_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ckan-devstaller-builder"));
    cmd.env_remove("DEVSTALLER_LOG");
    cmd
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = builder_bin()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_version_exits_zero() {
    let output = builder_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("ckan-devstaller-builder"));
}

#[test]
fn cli_help_lists_commands() {
    let output = builder_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    for cmd in ["compile", "presets", "options", "parse", "session", "wizard"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}': {stdout}");
    }
}

#[test]
fn compile_without_flags_prints_default_preset() {
    let output = builder_bin().arg("compile").output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(
        stdout_of(&output),
        "./ckan-devstaller \\\n--preset ckan-only \\\n--ckan-version 2.11.3\n"
    );
}

#[test]
fn compile_dathere_default_preset() {
    let output = builder_bin()
        .args(["compile", "--preset", "dathere-default"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_of(&output),
        "./ckan-devstaller \\\n\
         --preset dathere-default \\\n\
         --ckan-version 2.11.3 \\\n\
         --extensions ckanext-scheming DataStore DataPusher+ \\\n\
         --features enable-ssh\n"
    );
}

#[test]
fn compile_extension_pulls_prerequisites() {
    let output = builder_bin()
        .args(["compile", "-e", "DataPusher+"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(!stdout.contains("--preset"), "custom selection has no preset: {stdout}");
    assert!(stdout.contains("--extensions ckanext-scheming DataStore DataPusher+"));
}

#[test]
fn compile_unknown_preset_exits_conflict() {
    let output = builder_bin()
        .args(["compile", "--preset", "everything"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr_of(&output).contains("unknown preset 'everything'"));
    assert!(output.stdout.is_empty());
}

#[test]
fn compile_unsupported_version_warns() {
    let output = builder_bin()
        .args(["compile", "--ckan-version", "2.9.0"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("--ckan-version 2.9.0"));
    assert!(stderr_of(&output).contains("not a supported version"));
}

#[test]
fn compile_from_builder_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devstaller.toml");
    std::fs::write(
        &path,
        "ckan_version = \"2.10.8\"\nextensions = [\"DataStore\"]\nfeatures = [\"enable-ssh\"]\n",
    )
    .unwrap();
    let output = builder_bin()
        .args(["compile", "--file", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(
        stdout_of(&output),
        "./ckan-devstaller \\\n\
         --ckan-version 2.10.8 \\\n\
         --extensions DataStore \\\n\
         --features enable-ssh\n"
    );
}

#[test]
fn compile_rejects_unknown_builder_file_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devstaller.toml");
    std::fs::write(&path, "ckan_version = \"2.11.3\"\nplugins = [\"x\"]\n").unwrap();
    let output = builder_bin()
        .args(["compile", "--file", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("builder file error"));
}

#[test]
fn compile_rejects_flag_like_and_shell_tokens() {
    for args in [
        ["compile", "--extension=--preset"],
        ["compile", "--ckan-version=--features"],
        ["compile", "--feature=$(reboot)"],
    ] {
        let output = builder_bin().args(args).output().unwrap();
        assert_eq!(output.status.code(), Some(2), "{args:?}");
        assert!(stderr_of(&output).contains("builder file error"), "{args:?}");
        assert!(output.stdout.is_empty());
    }
}

#[test]
fn compile_json_output_is_stable() {
    let output = builder_bin()
        .args(["--json", "compile", "--preset", "dathere-default", "--skip-run"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["preset"], "dathere-default");
    assert_eq!(json["ckan_version"], "2.11.3");
    assert_eq!(
        json["extensions"],
        serde_json::json!(["ckanext-scheming", "DataStore", "DataPusher+"])
    );
    assert_eq!(json["features"], serde_json::json!(["enable-ssh"]));
    assert_eq!(json["argv"][0], "./ckan-devstaller");
    assert!(json["command"].as_str().unwrap().ends_with("--skip-run"));
}

#[test]
fn compile_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("install.sh");
    let output = builder_bin()
        .args(["compile", "--download-script", "--output", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("wget "));
    assert!(written.ends_with("--ckan-version 2.11.3\n"));
}

#[test]
fn presets_json_lists_catalog() {
    let output = builder_bin().args(["--json", "presets"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["ckan-only", "dathere-default"]);
}

#[test]
fn options_lists_prerequisites() {
    let output = builder_bin().arg("options").output().unwrap();
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("DataPusher+"));
    assert!(stdout.contains("ckanext-scheming, DataStore"));
}

#[test]
fn parse_reads_compiled_command_from_stdin() {
    let compiled = builder_bin()
        .args(["compile", "--preset", "dathere-default", "--download-script"])
        .output()
        .unwrap();
    assert!(compiled.status.success());

    let output = run_with_stdin(&["--json", "parse"], &stdout_of(&compiled));
    assert!(output.status.success(), "{}", stderr_of(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["preset"], "dathere-default");
    assert_eq!(json["options"]["download_script"], true);
    assert_eq!(json["unmet_requirements"], serde_json::json!([]));
}

#[test]
fn parse_rejects_unknown_flag() {
    let output = builder_bin()
        .args(["parse", "./ckan-devstaller --ckan-version 2.11.3 --color blue"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("command parse error"));
}

#[test]
fn session_reports_conflict_and_keeps_going() {
    let output = run_with_stdin(
        &["session"],
        "preset dathere-default\nextension DataStore\nversion 2.10.8\n",
    );
    assert_eq!(output.status.code(), Some(3));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("error: line 2:"), "{stderr}");
    assert!(stderr.contains("cannot remove the DataStore extension"));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("--ckan-version 2.10.8"));
    assert!(stdout.contains("--extensions ckanext-scheming DataStore DataPusher+"));
}

#[test]
fn wizard_requires_tty() {
    let output = run_with_stdin(&["wizard"], "");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("TTY"));
}

#[test]
fn completions_for_bash() {
    let output = builder_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("ckan-devstaller-builder"));
}
