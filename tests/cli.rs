//! CLI test cases.
//!
//! Most tests use `--engine precomputed`, which reads OCR results from the
//! JSON files in `tests/fixtures/ocr`, so they need no external tools. Tests
//! that run Poppler or Tesseract are ignored by default.

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

/// Create a new `Command` with our binary.
fn cmd() -> Command {
    Command::cargo_bin("idp-structure").unwrap()
}

/// Run a successful command and parse its JSONL output.
fn run_jsonl(command: &mut Command) -> Vec<Value> {
    let output = command.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_help() {
    cmd().arg("--help").assert().success();
}

#[test]
fn test_version() {
    cmd().arg("--version").assert().success();
}

#[test]
fn test_schema_output() {
    cmd()
        .args(["schema", "PaintingListOutput"])
        .assert()
        .success()
        .stdout(predicate::str::contains("merged_count"))
        .stdout(predicate::str::contains("processing_time"));
}

#[test]
fn test_schema_config() {
    cmd()
        .args(["schema", "StructureConfig"])
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate_header_ratio"));
}

#[test]
fn test_ocr_precomputed() {
    let outputs = run_jsonl(
        cmd()
            .arg("ocr")
            .arg("tests/fixtures/painting_list.jsonl")
            .args(["--engine", "precomputed"]),
    );
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0]["id"], json!("pl-1"));
    assert_eq!(outputs[0]["success"], json!(true));
    assert_eq!(outputs[0]["filename"], json!("painting_list.json"));
    assert_eq!(outputs[0]["total_pages"], json!(3));
    let full_text = outputs[0]["pages"][0]["full_text"].as_str().unwrap();
    assert!(full_text.starts_with("涂装明细表\n序号"), "{full_text}");
}

#[test]
fn test_tables_precomputed() {
    let outputs = run_jsonl(
        cmd()
            .arg("tables")
            .arg("tests/fixtures/painting_list.jsonl")
            .args(["--engine", "precomputed"]),
    );
    assert_eq!(outputs[0]["total_tables"], json!(3));
    let pages = outputs[0]["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["page"].as_u64().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(pages, vec![1, 2, 3]);
    assert_eq!(
        outputs[0]["tables"][0]["headers"],
        json!(["序号", "部位", "涂层", "面积"])
    );
}

#[test]
fn test_tables_with_config() {
    let outputs = run_jsonl(
        cmd()
            .arg("tables")
            .arg("tests/fixtures/painting_list.jsonl")
            .args(["--engine", "precomputed"])
            .args(["--config", "tests/fixtures/config/strict_tables.toml"]),
    );
    assert_eq!(outputs[0]["total_tables"], json!(0));
}

#[test]
fn test_layout_precomputed() {
    let outputs = run_jsonl(
        cmd()
            .arg("layout")
            .arg("tests/fixtures/painting_list.jsonl")
            .args(["--engine", "precomputed"]),
    );
    let blocks = outputs[0]["pages"][0]["blocks"].as_array().unwrap();
    assert_eq!(blocks.first().unwrap()["type"], json!("header"));
    assert_eq!(blocks.last().unwrap()["type"], json!("footer"));
    assert_eq!(blocks[1]["type"], json!("text"));
    assert_eq!(blocks[1]["bbox"], json!([100, 200, 180, 220]));
}

#[test]
fn test_painting_list_precomputed() {
    let outputs = run_jsonl(
        cmd()
            .arg("painting-list")
            .arg("tests/fixtures/painting_list.jsonl")
            .args(["--engine", "precomputed"]),
    );
    let output = &outputs[0];
    assert_eq!(output["raw_tables_count"], json!(3));
    assert_eq!(output["merged_count"], json!(1));
    assert_eq!(output["total_tables"], json!(2));
    // Page 2 repeats the header, so it is dropped and the rows are appended.
    assert_eq!(output["tables"][0]["page"], json!(1));
    assert_eq!(output["tables"][0]["row_count"], json!(4));
    assert_eq!(output["tables"][0]["col_count"], json!(4));
    assert_eq!(output["tables"][0]["rows"][3][1], json!("上建"));
    // The merged table still starts on page 1, so page 3 isn't adjacent.
    assert_eq!(output["tables"][1]["page"], json!(3));
}

#[test]
fn test_painting_list_max_pages() {
    let outputs = run_jsonl(
        cmd()
            .arg("painting-list")
            .arg("tests/fixtures/painting_list.jsonl")
            .args(["--engine", "precomputed", "--max-pages", "1"]),
    );
    let output = &outputs[0];
    assert_eq!(output["total_tables"], json!(1));
    assert_eq!(
        output["page_warnings"],
        json!(["Only 1/3 pages processed (because of --max-pages)"])
    );
}

#[test]
fn test_inspection_report_precomputed() {
    let outputs = run_jsonl(
        cmd()
            .arg("inspection-report")
            .arg("tests/fixtures/reports.csv")
            .args(["--engine", "precomputed", "--allowed-failure-rate", "0.5"]),
    );
    assert_eq!(outputs.len(), 3);

    let ut = &outputs[0];
    assert_eq!(ut["id"], json!("ut"));
    assert_eq!(ut["report_type"], json!("UT"));
    assert_eq!(
        ut["fields"],
        json!({
            "report_no": "UT-2023-015",
            "date": "2023-05-01",
            "inspector": "张伟",
            "equipment_no": null,
            "weld_no": "W-07",
            "material": "Q235B",
            "thickness": "12 mm",
            "standard": "NB/T47013.3-2015",
            "result": "合格",
            "defect_desc": null,
        })
    );
    assert_eq!(ut["warnings"], json!([]));
    assert_eq!(ut["total_pages"], json!(1));

    let rt = &outputs[1];
    assert_eq!(rt["report_type"], json!("RT"));
    assert_eq!(
        rt["warnings"],
        json!([
            "Required field 'report_no' not found in document",
            "Date '1999-05-01' may have invalid year format",
        ])
    );

    let blank = &outputs[2];
    assert_eq!(blank["success"], json!(false));
    assert_eq!(blank["error"], json!("No text extracted from document"));
    assert!(blank.get("fields").is_none());
}

#[test]
fn test_too_many_failures_is_an_error() {
    cmd()
        .arg("inspection-report")
        .arg("tests/fixtures/reports.csv")
        .args(["--engine", "precomputed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("were failures"));
}

#[test]
fn test_file_too_large() {
    let outputs = run_jsonl(
        cmd()
            .arg("tables")
            .arg("tests/fixtures/painting_list.jsonl")
            .args(["--engine", "precomputed", "--max-file-size", "10"])
            .args(["--allowed-failure-rate", "1.0"]),
    );
    assert_eq!(outputs[0]["success"], json!(false));
    let error = outputs[0]["error"].as_str().unwrap();
    assert!(error.starts_with("File too large: "), "{error}");
    assert!(error.ends_with(" bytes (max 10)"), "{error}");
}

#[test]
fn test_stdin_input_and_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.jsonl");
    cmd()
        .args(["tables", "--engine", "precomputed", "-o"])
        .arg(&out_path)
        .write_stdin("{\"id\": 1, \"path\": \"tests/fixtures/ocr/inspection_report.json\"}\n")
        .assert()
        .success();
    let output = std::fs::read_to_string(&out_path).unwrap();
    let record = serde_json::from_str::<Value>(output.trim()).unwrap();
    assert_eq!(record["id"], json!(1));
    assert_eq!(record["total_tables"], json!(0));
}

#[test]
#[ignore = "Requires poppler-utils and tesseract to be installed"]
fn test_ocr_tesseract_pdf() {
    let outputs = run_jsonl(
        cmd()
            .arg("ocr")
            .args(["--tesseract-lang", "eng", "--rasterize-dpi", "72"])
            .write_stdin(
                "{\"id\": \"pdf\", \"path\": \"tests/fixtures/documents/two_pages.pdf\"}\n",
            ),
    );
    assert_eq!(outputs[0]["success"], json!(true));
    assert_eq!(outputs[0]["total_pages"], json!(2));
}
