#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/pktplan-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn pktplan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pktplan"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("pktplan should run")
}

fn pktplan_with_stdin(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pktplan"))
        .args(["--log-level", "error"])
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("pktplan should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin)
        .expect("stdin should accept input");
    child.wait_with_output().expect("pktplan should finish")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn version_prints_package_version() {
    let output = pktplan(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("pktplan {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn version_extended_reports_features() {
    let output = pktplan(&["version", "--extended"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("name: pktplan"));
    assert!(text.contains("cli=true"));
}

#[test]
fn catalogue_lists_every_demo_type() {
    let output = pktplan(&["catalogue", "--format", "json"]);
    assert!(output.status.success());

    let text = stdout(&output);
    for expected in [
        "message 13",
        "message 67",
        "message 100",
        "module 1",
        "module 2",
        "DimensionUpdate",
        "has_port",
    ] {
        assert!(text.contains(expected), "missing {expected} in {text}");
    }
}

#[test]
fn sample_prints_frame_hex() {
    let output = pktplan(&["sample", "dimension-update", "--format", "pretty"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "0b00430200056c6f626279");
}

#[test]
fn sample_list_names_every_sample() {
    let output = pktplan(&["sample", "--list"]);
    assert!(output.status.success());
    let names: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert!(names.contains(&"ping".to_string()));
    assert!(names.contains(&"player-update".to_string()));
}

#[test]
fn unknown_sample_is_a_usage_error() {
    let output = pktplan(&["sample", "no-such-sample"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown sample"));
}

#[test]
fn sample_file_decodes_back() {
    let dir = unique_temp_dir("sample-file");
    let path = dir.join("chat.bin");
    let path_arg = path.to_str().expect("temp path should be utf-8");

    let written = pktplan(&["sample", "chat", "--out", path_arg]);
    assert!(written.status.success());

    let frame = std::fs::read(&path).expect("frame file should exist");
    assert_eq!(&frame[2..5], &[82, 0x01, 0x00]);

    let decoded = pktplan(&["decode", path_arg, "--format", "json"]);
    assert!(decoded.status.success());
    let text = stdout(&decoded);
    assert!(text.contains("ChatModule"));
    assert!(text.contains("hello"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_hex_skips_unknown_ids() {
    let output = pktplan_with_stdin(
        &["decode", "--hex", "--format", "json"],
        b"0500c8aabb\n0900520200 01000000\n",
    );
    assert!(output.status.success());

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    assert!(text.contains("unknown-message"));
    assert!(text.contains("PingModule"));
    assert!(lines.len() >= 2);
}

#[test]
fn decode_reports_truncated_input() {
    let output = pktplan_with_stdin(&["decode", "--hex", "--format", "json"], b"0900520200");
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("frame #0"));
}

#[test]
fn decode_rejects_bad_hex() {
    let output = pktplan_with_stdin(&["decode", "--hex"], b"zz");
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn strict_decode_rejects_trailing_bytes() {
    let input = b"0a00520200 01000000 ee";

    let lenient = pktplan_with_stdin(&["decode", "--hex", "--format", "json"], input);
    assert!(lenient.status.success());

    let strict = pktplan_with_stdin(&["decode", "--hex", "--strict", "--format", "json"], input);
    assert_eq!(strict.status.code(), Some(60));
}

#[test]
fn custom_multiplexed_id_changes_dispatch() {
    let output = pktplan_with_stdin(
        &["decode", "--hex", "--multiplexed-id", "200", "--format", "json"],
        b"0900c80200 01000000",
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("PingModule"));
}

#[test]
fn missing_input_file_maps_to_not_found() {
    let output = pktplan(&["decode", "/tmp/pktplan-does-not-exist/frames.bin"]);
    assert_eq!(output.status.code(), Some(51));
}
