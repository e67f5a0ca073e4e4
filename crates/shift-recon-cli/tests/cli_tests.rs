//! Integration tests for the `shift-recon` CLI binary.
//!
//! Fixture CSVs are copied into a temporary folder per test so result files
//! never land in the source tree.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FIXTURES: &[&str] = &["勤怠履歴.csv", "施設A.csv", "施設B.csv"];

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Helper: a temp folder holding the standard fixtures.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in FIXTURES {
        fs::copy(fixture_dir().join(name), dir.path().join(name)).unwrap();
    }
    dir
}

fn bin() -> Command {
    Command::cargo_bin("shift-recon").unwrap()
}

fn read_result(dir: &Path, facility: &str) -> String {
    let text = fs::read_to_string(dir.join(format!("result_{facility}.csv"))).unwrap();
    text.trim_start_matches('\u{FEFF}').to_string()
}

fn summary_json(dir: &Path, extra: &[&str]) -> serde_json::Value {
    let output = bin()
        .args(["check", "--summary-json", "-i"])
        .arg(dir)
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_writes_one_result_per_facility() {
    let dir = workspace();

    bin()
        .args(["check", "-i"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("施設A: 2 records, 2 flagged"))
        .stdout(predicate::str::contains("施設B: 2 records, 0 flagged"))
        .stdout(predicate::str::contains("conflicts: 1"));

    assert!(dir.path().join("result_施設A.csv").is_file());
    assert!(dir.path().join("result_施設B.csv").is_file());
    assert!(!dir.path().join("result_勤怠履歴.csv").exists());
}

#[test]
fn result_rows_carry_annotations_then_original_cells() {
    let dir = workspace();
    bin().args(["check", "-i"]).arg(dir.path()).assert().success();

    let text = read_result(dir.path(), "施設A");
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("flag,categories,substitutes,"));
    assert!(header.ends_with("西暦日付,担当所員,開始時間,終了時間,利用者"));

    let first = lines.next().unwrap();
    assert!(first.starts_with("◯,facility overlap,佐藤 花子/田中,30,"));
    assert!(first.ends_with("2026/03/01,山田 太郎,9:00,10:00,利用者1"));

    let second = lines.next().unwrap();
    assert!(second.starts_with("◯,exceeds attendance,none available,,60,"));
}

#[test]
fn result_rows_carry_worked_hours() {
    let dir = workspace();
    bin().args(["check", "-i"]).arg(dir.path()).assert().success();

    let text = read_result(dir.path(), "施設A");
    let mut lines = text.lines();
    assert!(lines
        .next()
        .unwrap()
        .contains("uncovered_intervals,worker_hours,substitute_hours,西暦日付"));

    let first = lines.next().unwrap();
    assert!(first.contains("\"山田 太郎: 09:00-12:00, 13:00-18:00\""));
    assert!(first.contains(",01(佐藤 花子): 08:00-12:00 | 02(田中): 09:00-17:00,"));

    // No substitutes for the second record, so the column is empty.
    assert!(lines.next().unwrap().contains(",田中: 09:00-17:00,,2026/03/01,"));
}

#[test]
fn unflagged_facility_has_empty_flag_column() {
    let dir = workspace();
    bin().args(["check", "-i"]).arg(dir.path()).assert().success();

    let text = read_result(dir.path(), "施設B");
    assert!(text.lines().skip(1).all(|line| line.starts_with(",,")));
}

#[test]
fn alt_delim_joins_substitutes() {
    let dir = workspace();
    bin()
        .args(["check", "--alt-delim", " & ", "-i"])
        .arg(dir.path())
        .assert()
        .success();

    assert!(read_result(dir.path(), "施設A").contains("佐藤 花子 & 田中"));
}

#[test]
fn output_folder_is_created() {
    let dir = workspace();
    let out = dir.path().join("out/nested");

    bin()
        .args(["check", "-i"])
        .arg(dir.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("result_施設A.csv").is_file());
    assert!(!dir.path().join("result_施設A.csv").exists());
}

#[test]
fn summary_json_reports_counts_and_audit() {
    let dir = workspace();
    let summary = summary_json(dir.path(), &[]);

    assert_eq!(summary["conflicts"], 1);
    assert_eq!(summary["flagged"], 2);
    assert_eq!(summary["facilities"].as_array().unwrap().len(), 2);
    assert_eq!(summary["facilities"][0]["facility"], "施設A");
    assert_eq!(summary["audit"]["attendance_rows"], 3);
    assert_eq!(summary["audit"]["service_records"], 4);
}

#[test]
fn rerun_ignores_previous_results() {
    let dir = workspace();
    bin().args(["check", "-i"]).arg(dir.path()).assert().success();

    let summary = summary_json(dir.path(), &[]);
    assert_eq!(summary["facilities"].as_array().unwrap().len(), 2);
}

#[test]
fn explicit_attendance_file_with_any_name() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture_dir().join("勤怠履歴.csv"), dir.path().join("staff.csv")).unwrap();
    fs::copy(fixture_dir().join("施設A.csv"), dir.path().join("施設A.csv")).unwrap();

    let summary = summary_json(dir.path(), &["--attendance-file", "staff.csv"]);
    assert_eq!(summary["facilities"].as_array().unwrap().len(), 1);
    assert_eq!(summary["facilities"][0]["facility"], "施設A");
}

#[test]
fn shift_jis_input_is_decoded() {
    let dir = workspace();
    for name in FIXTURES {
        let text = fs::read_to_string(fixture_dir().join(name)).unwrap();
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(&text);
        fs::write(dir.path().join(name), encoded.as_ref()).unwrap();
    }

    bin().args(["check", "-i"]).arg(dir.path()).assert().success();
    assert!(read_result(dir.path(), "施設A").contains("佐藤 花子/田中"));
}

#[test]
fn config_file_sets_options_and_flags_override() {
    let dir = workspace();
    let config = dir.path().join("recon.toml");
    fs::write(&config, "candidate_delimiter = \" + \"\n").unwrap();

    bin()
        .args(["check", "-i"])
        .arg(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    assert!(read_result(dir.path(), "施設A").contains("佐藤 花子 + 田中"));

    bin()
        .args(["check", "--alt-delim", ";", "-i"])
        .arg(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    assert!(read_result(dir.path(), "施設A").contains("佐藤 花子;田中"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Error handling
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn missing_attendance_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture_dir().join("施設A.csv"), dir.path().join("施設A.csv")).unwrap();

    bin()
        .args(["check", "-i"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No attendance CSV"));
}

#[test]
fn missing_facility_files_fail() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture_dir().join("勤怠履歴.csv"), dir.path().join("勤怠履歴.csv")).unwrap();

    bin()
        .args(["check", "-i"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No facility service CSVs"));
}

#[test]
fn missing_input_folder_fails() {
    bin()
        .args(["check", "-i", "/definitely/not/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn missing_worker_column_names_the_column() {
    let dir = workspace();
    fs::write(
        dir.path().join("施設C.csv"),
        "西暦日付,職員,開始時間,終了時間\n2026/03/01,田中,9:00,10:00\n",
    )
    .unwrap();

    bin()
        .args(["check", "-i"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("担当所員"));
}

#[test]
fn renamed_worker_column_via_flag() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture_dir().join("勤怠履歴.csv"), dir.path().join("勤怠履歴.csv")).unwrap();
    fs::write(
        dir.path().join("施設C.csv"),
        "西暦日付,職員,開始時間,終了時間\n2026/03/01,田中,9:00,10:00\n",
    )
    .unwrap();

    let summary = summary_json(dir.path(), &["--service-staff-col", "職員"]);
    assert_eq!(summary["flagged"], 0);
}

#[test]
fn invalid_identical_preference_is_rejected() {
    let dir = workspace();
    bin()
        .args(["check", "--identical-prefer", "sideways", "-i"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("earlier"));
}

// ─────────────────────────────────────────────────────────────────────────────
// normalize
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn normalize_arguments() {
    bin()
        .args(["normalize", "〇大宮　浩子", "早﨑　友音"])
        .assert()
        .success()
        .stdout("〇大宮　浩子\t大宮 浩子\n早﨑　友音\t早崎 友音\n");
}

#[test]
fn normalize_stdin_lines() {
    bin()
        .arg("normalize")
        .write_stdin("ＳＴＡＦＦ０１\r\n\n髙橋 一郎\n")
        .assert()
        .success()
        .stdout("ＳＴＡＦＦ０１\tSTAFF01\n髙橋 一郎\t高橋 一郎\n");
}
