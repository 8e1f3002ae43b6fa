// CLI integration tests for merge, letters, and error exit codes.
use std::path::Path;
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_dstmerge");
    let mut command = Command::new(exe);
    command.env_remove("DSTMERGE_LETTERS_DIR").env_remove("RUST_LOG");
    command
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn write_letter(dir: &Path, letter: char, header_byte: u8, stitches: &[u8]) {
    let mut raw = vec![header_byte; 512];
    raw.extend_from_slice(stitches);
    std::fs::write(dir.join(format!("{letter}.dst")), raw).expect("write letter");
}

fn letters_fixture() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    write_letter(temp.path(), 'A', 0xAA, &[0x0A, 0x0A, 0x00, 0x00, 0xF3]);
    write_letter(temp.path(), 'B', 0xBB, &[0x0B, 0x0B]);
    write_letter(temp.path(), 'C', 0xCC, &[0x0C, 0x00, 0x00, 0xF3]);
    temp
}

#[test]
fn merge_writes_word_file_in_typed_order() {
    let letters = letters_fixture();
    let out = tempfile::tempdir().expect("tempdir");

    let merge = cmd()
        .args([
            "merge",
            "C1a!B",
            "--letters-dir",
            letters.path().to_str().unwrap(),
            "--out",
            out.path().to_str().unwrap(),
        ])
        .output()
        .expect("merge");
    assert!(
        merge.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&merge.stderr)
    );

    let summary = parse_json(std::str::from_utf8(&merge.stdout).expect("utf8"));
    assert_eq!(summary["letters"], "CAB");
    assert_eq!(summary["file"], "CAB.dst");
    assert_eq!(summary["word"], "C1a!B");

    let merged = std::fs::read(out.path().join("CAB.dst")).expect("merged file");
    assert!(merged[..512].iter().all(|byte| *byte == 0xCC));
    assert_eq!(
        &merged[512..],
        &[0x0C, 0x0A, 0x0A, 0x0B, 0x0B, 0x00, 0x00, 0xF3]
    );
    assert_eq!(summary["bytes"].as_u64(), Some(merged.len() as u64));

    // B.dst has no end marker; that is reported, not fatal.
    let stderr = String::from_utf8_lossy(&merge.stderr);
    let notice = stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|value| value.get("notice").is_some())
        .expect("notice line");
    assert_eq!(notice["notice"]["kind"], "unterminated");
    assert_eq!(notice["notice"]["details"]["letter"], "B");
}

#[test]
fn merge_to_stdout_emits_raw_bytes() {
    let letters = letters_fixture();
    let merge = cmd()
        .args([
            "merge",
            "a",
            "--letters-dir",
            letters.path().to_str().unwrap(),
            "--out",
            "-",
        ])
        .output()
        .expect("merge");
    assert!(merge.status.success());
    assert_eq!(merge.stdout.len(), 512 + 2 + 3);
    assert_eq!(&merge.stdout[512..], &[0x0A, 0x0A, 0x00, 0x00, 0xF3]);
}

#[test]
fn missing_letter_exit_code_and_no_output() {
    let letters = letters_fixture();
    let out = tempfile::tempdir().expect("tempdir");

    let merge = cmd()
        .args([
            "merge",
            "abz",
            "--letters-dir",
            letters.path().to_str().unwrap(),
            "--out",
            out.path().to_str().unwrap(),
        ])
        .output()
        .expect("merge");
    assert_eq!(merge.status.code().unwrap(), 3);
    assert!(!out.path().join("ABZ.dst").exists());

    let stderr = String::from_utf8_lossy(&merge.stderr);
    let error = stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|value| value.get("error").is_some())
        .expect("error line");
    assert_eq!(error["error"]["kind"], "ResourceUnavailable");
    assert_eq!(error["error"]["letter"], "Z");
}

#[test]
fn invalid_word_exit_code() {
    let letters = letters_fixture();
    let merge = cmd()
        .args([
            "merge",
            "1234",
            "--letters-dir",
            letters.path().to_str().unwrap(),
        ])
        .output()
        .expect("merge");
    assert_eq!(merge.status.code().unwrap(), 2);
}

#[test]
fn truncated_letter_exit_code() {
    let letters = letters_fixture();
    std::fs::write(letters.path().join("D.dst"), [0u8; 100]).expect("write");
    let out = tempfile::tempdir().expect("tempdir");

    let merge = cmd()
        .args([
            "merge",
            "ad",
            "--letters-dir",
            letters.path().to_str().unwrap(),
            "--out",
            out.path().to_str().unwrap(),
        ])
        .output()
        .expect("merge");
    assert_eq!(merge.status.code().unwrap(), 7);
    assert!(!out.path().join("AD.dst").exists());
}

#[test]
fn existing_output_requires_force() {
    let letters = letters_fixture();
    let out = tempfile::tempdir().expect("tempdir");
    let target = out.path().join("AB.dst");
    std::fs::write(&target, b"keep").expect("write");

    let args = [
        "merge",
        "ab",
        "--letters-dir",
        letters.path().to_str().unwrap(),
        "--out",
        target.to_str().unwrap(),
    ];
    let merge = cmd().args(args).output().expect("merge");
    assert_eq!(merge.status.code().unwrap(), 4);
    assert_eq!(std::fs::read(&target).expect("read"), b"keep");

    let forced = cmd().args(args).arg("--force").output().expect("merge");
    assert!(forced.status.success());
    assert_eq!(std::fs::read(&target).expect("read").len(), 512 + 4 + 3);
}

#[test]
fn failed_write_exit_code_and_no_leftovers() {
    let letters = letters_fixture();
    let out = tempfile::tempdir().expect("tempdir");
    let target = out.path().join("missing").join("AB.dst");

    let merge = cmd()
        .args([
            "merge",
            "ab",
            "--letters-dir",
            letters.path().to_str().unwrap(),
            "--out",
            target.to_str().unwrap(),
        ])
        .output()
        .expect("merge");
    assert_eq!(merge.status.code().unwrap(), 8);
    assert!(merge.stdout.is_empty());
    assert!(!target.exists());
    assert_eq!(std::fs::read_dir(out.path()).expect("read_dir").count(), 0);

    let stderr = String::from_utf8_lossy(&merge.stderr);
    let error = stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|value| value.get("error").is_some())
        .expect("error line");
    assert_eq!(error["error"]["kind"], "Io");
}

#[test]
fn letters_dir_env_is_the_default_source() {
    let letters = letters_fixture();
    let out = tempfile::tempdir().expect("tempdir");
    let merge = cmd()
        .env("DSTMERGE_LETTERS_DIR", letters.path())
        .args(["merge", "b", "--out", out.path().to_str().unwrap()])
        .output()
        .expect("merge");
    assert!(merge.status.success());
    assert!(out.path().join("B.dst").exists());
}

#[test]
fn letters_command_lists_table() {
    let letters = letters_fixture();
    let output = cmd()
        .args(["letters", "--letters-dir", letters.path().to_str().unwrap()])
        .output()
        .expect("letters");
    assert!(output.status.success());
    let value = parse_json(std::str::from_utf8(&output.stdout).expect("utf8"));
    let table = value["letters"].as_array().expect("letters");
    assert_eq!(table.len(), 26);
    let present: Vec<&str> = table
        .iter()
        .filter(|entry| entry["present"] == true)
        .filter_map(|entry| entry["letter"].as_str())
        .collect();
    assert_eq!(present, vec!["A", "B", "C"]);
}

#[test]
fn usage_exit_code() {
    let output = cmd().args(["merge"]).output().expect("merge");
    assert_eq!(output.status.code().unwrap(), 2);
}
