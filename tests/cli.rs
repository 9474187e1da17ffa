use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const REPORT: &str = "HEADER|Concur|2024\n\
                      DETAIL|x|2024-01-05|a|b|Smith|Jane|c|d|Finance\n\
                      DETAIL|x|2024-01-06|a|b|Doe|John|c|d|Sales\n\
                      SUMMARY|2\n";

fn concur_convert() -> Command {
    let mut cmd = Command::cargo_bin("concur-convert").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_report(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn converts_report_to_xlsx() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_report(temp_dir.path(), "march.txt", REPORT);

    concur_convert()
        .arg(&input)
        .args(["--output-format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows processed: 2"));

    let workbook = fs::read(temp_dir.path().join("march_converted.xlsx")).unwrap();
    assert!(workbook.starts_with(b"PK"));
}

#[test]
fn converts_report_to_csv_in_output_directory() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_report(temp_dir.path(), "march.txt", REPORT);
    let output_dir = temp_dir.path().join("out");

    concur_convert()
        .arg(&input)
        .args(["--format", "csv", "--quiet", "--output"])
        .arg(&output_dir)
        .assert()
        .success();

    let content = fs::read_to_string(output_dir.join("march_converted.csv")).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Date,PartnerId,Quantity,UserName,Department,Purpose,Value",
            "2024-01-05,,,Smith Jane,Finance,,",
            "2024-01-06,,,Doe John,Sales,,",
        ]
    );
}

#[test]
fn converts_report_to_json() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_report(temp_dir.path(), "march.txt", REPORT);

    concur_convert()
        .arg(&input)
        .args(["-f", "json", "-q"])
        .assert()
        .success();

    let content = fs::read_to_string(temp_dir.path().join("march_converted.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json[0]["UserName"], "Smith Jane");
    assert_eq!(json[1]["Department"], "Sales");
    assert_eq!(json[1]["Value"], "");
}

#[test]
fn keeps_first_record_after_byte_order_mark_and_accented_names() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("windows.txt");
    fs::write(
        &input,
        b"\xEF\xBB\xBFDETAIL|x|2024-01-05|a|b|M\xFCller|Jane\r\nDETAIL|x|2024-01-06|a|b|Doe|John\r\n",
    )
    .unwrap();

    concur_convert()
        .arg(&input)
        .args(["-f", "csv", "-q"])
        .assert()
        .success();

    let content = fs::read_to_string(temp_dir.path().join("windows_converted.csv")).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "2024-01-05,,,M\u{FFFD}ller Jane,,,");
    assert_eq!(lines[2], "2024-01-06,,,Doe John,,,");
}

#[test]
fn report_without_detail_lines_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_report(temp_dir.path(), "empty.txt", "HEADER\nSUMMARY\n");

    concur_convert()
        .arg(&input)
        .args(["--output-format", "plain"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("No valid data found"));

    assert!(!temp_dir.path().join("empty_converted.xlsx").exists());
}

#[test]
fn rejects_wrong_extension() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_report(temp_dir.path(), "march.pdf", REPORT);

    concur_convert()
        .arg(&input)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn existing_output_requires_force() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_report(temp_dir.path(), "march.txt", REPORT);
    let output = write_report(temp_dir.path(), "march_converted.csv", "old");

    concur_convert()
        .arg(&input)
        .args(["-f", "csv", "-q"])
        .assert()
        .code(8);
    assert_eq!(fs::read_to_string(&output).unwrap(), "old");

    concur_convert()
        .arg(&input)
        .args(["-f", "csv", "-q", "--force"])
        .assert()
        .success();
    assert!(fs::read_to_string(&output).unwrap().contains("Smith Jane"));
}

#[test]
fn directory_with_partial_failures_exits_with_warning_code() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("exports");
    fs::create_dir_all(input_dir.join("2024")).unwrap();
    write_report(&input_dir, "a.txt", REPORT);
    write_report(&input_dir.join("2024"), "b.txt", REPORT);
    write_report(&input_dir, "broken.txt", "no detail lines");

    let output_dir = temp_dir.path().join("out");

    concur_convert()
        .arg(&input_dir)
        .args(["-f", "csv", "--report", "--output-format", "plain", "--output"])
        .arg(&output_dir)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Files converted: 2"));

    assert!(output_dir.join("a_converted.csv").exists());
    assert!(output_dir.join("2024").join("b_converted.csv").exists());
    assert!(!output_dir.join("broken_converted.csv").exists());

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output_dir.join("conversion_report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["total_rows"], 4);
    assert_eq!(report["failures"].as_array().unwrap().len(), 1);
}

#[test]
fn dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_report(temp_dir.path(), "march.txt", REPORT);

    concur_convert()
        .arg(&input)
        .args(["--dry-run", "--output-format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("march_converted.xlsx"));

    assert!(!temp_dir.path().join("march_converted.xlsx").exists());
}

#[test]
fn generates_sample_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("concur-convert.toml");

    concur_convert()
        .args(["--generate-config", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated sample configuration file"));

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("sheet_name = \"Concur Data\""));
}

#[test]
fn config_file_sets_output_format() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_report(temp_dir.path(), "march.txt", REPORT);
    let config_path = write_report(
        temp_dir.path(),
        "settings.toml",
        "[output]\nformat = \"csv\"\nfile_suffix = \"_concur\"\n",
    );

    concur_convert()
        .arg(&input)
        .arg("--config")
        .arg(&config_path)
        .arg("-q")
        .assert()
        .success();

    assert!(temp_dir.path().join("march_concur.csv").exists());
}

#[test]
fn invalid_sheet_name_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_report(temp_dir.path(), "march.txt", REPORT);

    concur_convert()
        .arg(&input)
        .args(["--sheet-name", "Q1/Q2"])
        .assert()
        .code(3);
}

#[test]
fn help_lists_options() {
    concur_convert()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--sheet-name"))
        .stdout(predicate::str::contains("--dry-run"));
}
