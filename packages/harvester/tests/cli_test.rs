//! Tests for the offline commands of the binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn harvester() -> Command {
    Command::cargo_bin("leychile-harvester").unwrap()
}

#[test]
fn test_normalize_command() {
    harvester()
        .args(["normalize", "Primero Transitorio", "Artículo 1 bis"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Primero Transitorio\tt1"))
        .stdout(predicate::str::contains("Artículo 1 bis\t1bis"));
}

#[test]
fn test_normalize_requires_labels() {
    harvester().arg("normalize").assert().failure();
}

#[test]
fn test_normalize_json() {
    let output = harvester()
        .args(["--format", "json", "normalize", "XV"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["label"], "XV");
    assert_eq!(json[0]["canonical_id"], "15");
}

#[test]
fn test_parse_fixture_as_json() {
    let output = harvester()
        .arg("parse")
        .arg(fixture_path("ley_21595.xml"))
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["canonical_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["1", "1bis", "2", "final", "t1"]);
}

#[test]
fn test_parse_single_article() {
    harvester()
        .arg("parse")
        .arg(fixture_path("ley_21595.xml"))
        .args(["--article", "1 bis"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Artículo 1 bis"))
        .stdout(predicate::str::contains("artículo 2314 del Código Civil"));
}

#[test]
fn test_parse_missing_article_fails_with_suggestions() {
    harvester()
        .arg("parse")
        .arg(fixture_path("ley_21595.xml"))
        .args(["--article", "3 bis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("1bis"));
}

#[test]
fn test_parse_rejects_malformed_xml() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("roto.xml");
    fs::write(&file, "<Norma><EstructuraFuncional>").unwrap();

    harvester().arg("parse").arg(&file).assert().failure();
}

#[test]
fn test_search_range_is_enforced() {
    harvester()
        .args(["search", "delito", "--max-laws", "51"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("51"));
}
