//! CLI integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const HEADER: &str = "Composition,Crosslinker,Gauge,LH (mm),Pressure (kPa),TG (°C),Printable";

fn bioprint(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bioprint"))
        .args(args)
        .env_remove("BIOPRINT_MODEL_DIR")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute command")
}

/// Dataset where printability follows pressure and layer height
fn write_dataset(dir: &Path) -> PathBuf {
    let mut lines = vec![HEADER.to_string()];
    for i in 0..60 {
        let silk = 3 + (i % 5);
        let gelatin = 12 + (i % 6);
        let kpa = 10 + (i * 13) % 70;
        let lh = if i % 3 == 0 { "0.3" } else { "0.1" };
        let printable = if kpa >= 35 && lh == "0.1" { "Yes" } else { "No" };
        lines.push(format!(
            "\"Silk {silk}%, Gelatin {gelatin}%\",Genipin,22,{lh},{kpa},25,{printable}"
        ));
    }
    lines.push("\"Silk ?%, Gelatin 15%\",None,22,0.1,40,25,Yes".to_string());

    let path = dir.join("raw_data.csv");
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn train_into(temp: &TempDir) -> String {
    let data = write_dataset(temp.path());
    let model_dir = temp.path().join("models");
    let model_dir = model_dir.to_str().unwrap().to_string();

    let output = bioprint(&[
        "train",
        "--data",
        data.to_str().unwrap(),
        "--model-dir",
        &model_dir,
    ]);
    assert!(
        output.status.success(),
        "train should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    model_dir
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = bioprint(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Bioink Printability Predictor"),
        "Should show app name"
    );
    for command in ["train", "predict", "ranges", "importance"] {
        assert!(stdout.contains(command), "Should show {command} command");
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = bioprint(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("bioprint"), "Should show binary name");
}

/// Test predict subcommand help lists every input
#[test]
fn test_predict_help() {
    let output = bioprint(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for flag in [
        "--silk",
        "--gelatin",
        "--crosslinker",
        "--needle",
        "--height",
        "--pressure",
        "--temp",
    ] {
        assert!(stdout.contains(flag), "Should show {flag} option");
    }
}

/// Test ranges output in JSON format
#[test]
fn test_ranges_json() {
    let output = bioprint(&["ranges", "--format", "json"]);
    assert!(output.status.success());

    let ranges: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ranges["pressure"]["default"], 6.0);
    assert_eq!(ranges["needle"]["min"], 10.0);
    assert_eq!(ranges["temp"]["step"], 0.5);
}

/// Test ranges output as a table
#[test]
fn test_ranges_table() {
    let output = bioprint(&["ranges"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Parameter"));
    assert!(stdout.contains("gelatin"));
}

/// Test that predict without a trained model fails clearly
#[test]
fn test_predict_without_model_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nothing-here");

    let output = bioprint(&["predict", "--model-dir", missing.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("bioprint train"), "Should hint at training");
}

/// Test that non-numeric input is rejected before the model is touched
#[test]
fn test_predict_rejects_non_numeric_input() {
    let output = bioprint(&["predict", "--silk", "five"]);
    assert!(!output.status.success());
}

/// Test train, then predict and importance against the saved model
#[test]
fn test_train_then_predict() {
    let temp = TempDir::new().unwrap();
    let model_dir = train_into(&temp);

    for file in ["model.json", "features.json", "manifest.json", "feature_importance.json"] {
        assert!(
            Path::new(&model_dir).join(file).is_file(),
            "missing {file}"
        );
    }

    let output = bioprint(&[
        "predict",
        "--model-dir",
        &model_dir,
        "--crosslinker",
        "--pressure",
        "1.5",
        "--format",
        "json",
    ]);
    assert!(
        output.status.success(),
        "predict should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["prediction"], "Printable: NO");
    assert_eq!(result["remarks"], "Pressure too low for proper extrusion.");
    assert_eq!(result["inputs"]["needle_gauge"], 22);
    assert!(result["probability"]
        .as_str()
        .unwrap()
        .starts_with("Probability: "));

    let output = bioprint(&["importance", "--model-dir", &model_dir, "--format", "json"]);
    assert!(output.status.success());
    let ranking: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ranking.as_array().unwrap().len(), 7);
}

/// Test train reports dropped records in JSON output
#[test]
fn test_train_json_summary() {
    let temp = TempDir::new().unwrap();
    let data = write_dataset(temp.path());
    let model_dir = temp.path().join("models");

    let output = bioprint(&[
        "train",
        "--data",
        data.to_str().unwrap(),
        "--model-dir",
        model_dir.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total_samples"], 60);
    assert_eq!(report["summary"]["dropped_records"], 1);
    assert!(report["model_version"]
        .as_str()
        .unwrap()
        .starts_with("rf100-s42-"));
}

/// Test out-of-range input is rejected with the offending field named
#[test]
fn test_predict_rejects_out_of_range_input() {
    let temp = TempDir::new().unwrap();
    let model_dir = train_into(&temp);

    let output = bioprint(&["predict", "--model-dir", &model_dir, "--height", "2.0"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("height"), "Should name the field: {stderr}");
}
