//! Basic CLI integration tests.

#![allow(deprecated)] // Command::cargo_bin deprecated for custom build-dir; still works for default

use assert_cmd::Command;
use pretty_assertions::assert_eq;

const JSON_REPORT: &str = r#"{"Machine": {"Name": "bot-1"}, "Tests": [{"Name": "a", "Data": [1.5]}]}"#;

const PLIST_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>Machine</key>
	<dict>
		<key>Name</key>
		<string>bot-1</string>
	</dict>
</dict>
</plist>
"#;

fn lnt_formats() -> Command {
    Command::cargo_bin("lnt-formats").unwrap()
}

#[test]
fn help_prints_and_exits_success() {
    lnt_formats().arg("--help").assert().success();
}

#[test]
fn formats_json_lists_plist_then_json() {
    let out = lnt_formats().args(["formats", "--json"]).assert().success();
    let stdout = std::str::from_utf8(&out.get_output().stdout).unwrap();
    let listing: serde_json::Value =
        serde_json::from_str(stdout).expect("formats --json should output valid JSON");
    let names: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["plist", "json"]);
}

#[test]
fn detect_reports_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("report.json");
    let plist = dir.path().join("report.plist");
    let text = dir.path().join("notes.txt");
    std::fs::write(&json, JSON_REPORT).unwrap();
    std::fs::write(&plist, PLIST_REPORT).unwrap();
    std::fs::write(&text, "just words\n").unwrap();

    let out = lnt_formats()
        .arg("detect")
        .args([&json, &plist, &text])
        .assert()
        .success();
    let stdout = std::str::from_utf8(&out.get_output().stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(": json"));
    assert!(lines[1].ends_with(": plist"));
    assert!(lines[2].ends_with(": unknown"));
}

#[test]
fn detect_nonexistent_file_fails() {
    lnt_formats()
        .args(["detect", "/nonexistent/report.json"])
        .assert()
        .failure();
}

#[test]
fn convert_json_to_plist_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("report.json");
    std::fs::write(&json, JSON_REPORT).unwrap();

    let out = lnt_formats()
        .arg("convert")
        .arg(&json)
        .args(["--to", "plist"])
        .assert()
        .success();
    let stdout = std::str::from_utf8(&out.get_output().stdout).unwrap();
    assert!(stdout.starts_with("<?xml"));
    assert!(stdout.contains("<string>bot-1</string>"));
    assert!(stdout.contains("<real>1.5</real>"));
}

#[test]
fn convert_plist_from_stdin_to_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.json");

    lnt_formats()
        .args(["convert", "-", "--to", "json", "-o"])
        .arg(&out_path)
        .write_stdin(PLIST_REPORT)
        .assert()
        .success();

    let written = std::fs::read_to_string(&out_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["Machine"]["Name"], "bot-1");
}

#[test]
fn convert_plain_text_fails_detection() {
    let out = lnt_formats()
        .args(["convert", "-", "--from", "<auto>", "--to", "json"])
        .write_stdin("no markers here\n")
        .assert()
        .failure();
    let stderr = std::str::from_utf8(&out.get_output().stderr).unwrap();
    assert!(stderr.contains("unable to guess input format for file"));
}

#[test]
fn convert_unknown_input_format_fails() {
    let out = lnt_formats()
        .args(["convert", "-", "--from", "nonexistent-format", "--to", "json"])
        .write_stdin(JSON_REPORT)
        .assert()
        .failure();
    let stderr = std::str::from_utf8(&out.get_output().stderr).unwrap();
    assert!(stderr.contains("unknown input format"));
}

#[test]
fn convert_failure_leaves_no_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.plist");

    lnt_formats()
        .args(["convert", "-", "--from", "<auto>", "--to", "plist", "-o"])
        .arg(&out_path)
        .write_stdin("[null]")
        .assert()
        .failure();
    assert!(!out_path.exists());
}

#[test]
fn config_show_json_valid() {
    let out = lnt_formats()
        .args(["config", "show", "--json"])
        .assert()
        .success();
    let stdout = std::str::from_utf8(&out.get_output().stdout).unwrap();
    let _: serde_json::Value =
        serde_json::from_str(stdout).expect("config show --json should output valid JSON");
}
