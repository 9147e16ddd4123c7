#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn bipf(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bipf"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("bipf should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn encode_json_argument_as_hex() {
    let output = bipf(&["--format", "hex", "encode", "--json", r#"{"a":1}"#]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "3d08612201000000");
}

#[test]
fn encode_json_format_reports_size() {
    let output = bipf(&["--format", "json", "encode", "--json", "true"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), r#"{"size":2,"hex":"0e01"}"#);
}

#[test]
fn encode_reads_stdin_and_writes_raw() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_bipf"))
        .args(["--format", "raw", "encode"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("encode should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"[null]")
        .expect("stdin should accept input");
    let output = child.wait_with_output().expect("encode should finish");

    assert!(output.status.success());
    assert_eq!(output.stdout, [0x0c, 0x06]);
}

#[test]
fn encode_rejects_invalid_json() {
    let output = bipf(&["encode", "--json", "{not json"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn decode_hex_to_json() {
    let output = bipf(&["--format", "json", "decode", "--hex", "3d08612201000000"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), r#"{"a":1}"#);
}

#[test]
fn decode_buffer_uses_marker_object() {
    let output = bipf(&["--format", "json", "decode", "--hex", "11dead"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), r#"{"$buffer":"dead"}"#);
}

#[test]
fn decode_truncated_input_returns_60() {
    let output = bipf(&["--format", "json", "decode", "--hex", "2201"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("decode failed"));
}

#[test]
fn decode_rejects_bad_hex() {
    let output = bipf(&["decode", "--hex", "zz"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn decode_missing_file_returns_1() {
    let output = bipf(&["decode", "--file", "/nonexistent/bipf-input.bin"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn conflicting_inputs_are_usage_errors() {
    let output = bipf(&["decode", "--hex", "06", "--file", "in.bin"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn inspect_lists_tags() {
    let output = bipf(&["--format", "json", "inspect", "--hex", "0c06"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        r#"[{"offset":0,"depth":0,"type":"ARRAY","length":1},{"offset":1,"depth":1,"type":"BOOLNULL","length":0}]"#
    );
}

#[test]
fn version_prints_package_version() {
    let output = bipf(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        format!("bipf {}", env!("CARGO_PKG_VERSION"))
    );
}
