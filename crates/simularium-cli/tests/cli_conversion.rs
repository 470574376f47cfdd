use serde_json::Value;
use simularium_core::OutputEncoding;
use simularium_core::simularium::read_document;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<omexManifest xmlns="http://identifiers.org/combine.specifications/omex-manifest">
  <content location="./model.txt" format="http://purl.org/NET/mediatypes/text/smoldyn+plain"/>
  <content location="./simulation.sedml" format="http://identifiers.org/combine.specifications/sed-ml"/>
</omexManifest>
"#;

const SEDML: &str = r#"<sedML><listOfModels><model id="m" source="model.txt"/></listOfModels></sedML>"#;

const MODEL: &str = "dim 3\nspecies red green\nboundaries x 0 10\nboundaries y 0 10\nboundaries z 0 10\n";

const LOG: &str = "0 0\nred 1 1 1\ngreen 2 2 2\n0.5 1\nred 1 2 1\ngreen 2 2 3\n1 2\nred 1 3 1\ngreen 2 2 4\n";

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent directory should be created");
    }
    fs::write(path, content).expect("fixture file should be written");
}

fn write_archive(temp: &TempDir, log: &str) -> PathBuf {
    let root = temp.path().join("cell");
    write_file(&root.join("manifest.xml"), MANIFEST);
    write_file(&root.join("simulation.sedml"), SEDML);
    write_file(&root.join("model.txt"), MODEL);
    write_file(&root.join("modelout.txt"), log);
    root
}

fn run_cli(args: &[&str]) -> Output {
    let binary_path = env!("CARGO_BIN_EXE_smoldyn2simularium");
    Command::new(binary_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("smoldyn2simularium should run")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("tempdir paths should be valid UTF-8")
}

#[test]
fn convert_writes_default_output_and_prints_summary() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, LOG);

    let output = run_cli(&["convert", path_arg(&root)]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("frames: 3"), "stdout: {}", stdout);
    assert!(stdout.contains("registered in manifest: yes"), "stdout: {}", stdout);

    let (document, encoding) =
        read_document(&root.join("cell.simularium")).expect("output should decode");
    assert_eq!(encoding, OutputEncoding::Json);
    assert_eq!(document.frame_count(), 3);
}

#[test]
fn convert_accepts_binary_encoding_and_agent_params() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, LOG);
    let params = temp.path().join("params.json");
    write_file(&params, r#"{"red": {"density": 1.0, "molecular_mass": 11004}}"#);
    let destination = temp.path().join("out/cell.bin");

    let output = run_cli(&[
        "convert",
        path_arg(&root),
        "--encoding",
        "binary",
        "--agent-params",
        path_arg(&params),
        "--output",
        path_arg(&destination),
    ]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(derived)"), "stdout: {}", stdout);
    assert!(stdout.contains("registered in manifest: no"), "stdout: {}", stdout);

    let (document, encoding) = read_document(&destination).expect("output should decode");
    assert_eq!(encoding, OutputEncoding::Binary);
    assert_eq!(document.agent_type_count(), 2);
}

#[test]
fn trajectory_errors_exit_with_parse_code_and_line() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, "0 0\nred 1 1 1\ngreen 2 2\n");

    let output = run_cli(&["convert", path_arg(&root)]);
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [TRAJECTORY.RECORD]"), "stderr: {}", stderr);
    assert!(stderr.contains("modelout.txt:3"), "stderr: {}", stderr);
    assert!(stderr.contains("after stage ModelExtracted"), "stderr: {}", stderr);
}

#[test]
fn missing_archive_exits_with_structure_code() {
    let temp = TempDir::new().expect("tempdir should be created");

    let output = run_cli(&["convert", path_arg(&temp.path().join("absent"))]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [ARCHIVE."), "stderr: {}", stderr);
}

#[test]
fn invalid_arguments_are_usage_errors() {
    let output = run_cli(&["convert", "somewhere", "--encoding", "yaml"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [CLI.USAGE]"), "stderr: {}", stderr);

    let output = run_cli(&["convert", "somewhere", "--box-size", "0"]);
    assert_eq!(output.status.code(), Some(1));

    let output = run_cli(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("convert"));
}

#[test]
fn inspect_reports_archive_as_json() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, LOG);

    let output = run_cli(&["inspect", path_arg(&root), "--json"]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: Value =
        serde_json::from_slice(&output.stdout).expect("inspect output should be JSON");
    assert_eq!(summary["frame_count"], 3);
    assert_eq!(summary["record_count"], 6);
    assert_eq!(summary["dimensionality"], 3);
    assert_eq!(summary["agents"], serde_json::json!(["red", "green"]));
    assert_eq!(summary["model_box"], serde_json::json!([10.0, 10.0, 10.0]));
    assert!(!root.join("cell.simularium").exists());
    assert!(summary["time_course_step"].is_null());
}

#[test]
fn inspect_reports_time_course_step() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, LOG);
    write_file(
        &root.join("simulation.sedml"),
        r#"<sedML><listOfModels><model id="m" source="model.txt"/></listOfModels>
<listOfSimulations><uniformTimeCourse id="sim" initialTime="0" outputStartTime="0" outputEndTime="1" numberOfSteps="2"/></listOfSimulations></sedML>"#,
    );

    let output = run_cli(&["inspect", path_arg(&root)]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("time course steps: 2"), "stdout: {}", stdout);
    assert!(stdout.contains("time course step: 0.5"), "stdout: {}", stdout);
}

#[test]
fn decode_summarizes_converted_file() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, LOG);
    let converted = run_cli(&["convert", path_arg(&root), "--encoding", "binary", "--title", "Cell run"]);
    assert_eq!(converted.status.code(), Some(0));

    let output = run_cli(&["decode", path_arg(&root.join("cell.simularium")), "--json"]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: Value =
        serde_json::from_slice(&output.stdout).expect("decode output should be JSON");
    assert_eq!(summary["encoding"], "binary");
    assert_eq!(summary["title"], "Cell run");
    assert_eq!(summary["frame_count"], 3);
    assert_eq!(summary["agent_types"], serde_json::json!(["0=red", "1=green"]));
}
