use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const IES: &str = "IESNA:LM-63-2002\n\
[TEST] T-100\n\
[MANUFAC] Acme Lighting\n\
[LUMCAT] DL-6\n\
TILT=NONE\n\
1 1000 1 3 2 1 2 0.2 0.2 0.1\n\
1 1 15\n\
0 45 90\n\
0 180\n\
300 200 0\n\
310 210 5\n";

/// CLI with HOME pointed at `home`, so no user config leaks in.
fn lumen(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lumen-cli").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn write_ies(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, IES).unwrap();
    path
}

#[test]
fn lumen_detect_reports_ies() {
    let tmp = tempdir().unwrap();
    let input = write_ies(tmp.path(), "lamp.dat");
    lumen(tmp.path())
        .args(["detect", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("ies LM-63-2002"));
}

#[test]
fn lumen_detect_json() {
    let tmp = tempdir().unwrap();
    let input = write_ies(tmp.path(), "lamp.ies");
    let output = lumen(tmp.path())
        .args(["detect", input.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["format"], "ies");
    assert_eq!(report["version"], "LM-63-2002");
}

#[test]
fn lumen_convert_writes_default_output() {
    let tmp = tempdir().unwrap();
    let input = write_ies(tmp.path(), "lamp.ies");
    lumen(tmp.path())
        .args(["convert", input.to_str().unwrap(), "--to", "ldt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted"));
    let written = fs::read_to_string(tmp.path().join("lamp.ldt")).unwrap();
    assert!(written.starts_with("Acme Lighting\n"));
}

#[test]
fn lumen_convert_applies_overrides() {
    let tmp = tempdir().unwrap();
    let input = write_ies(tmp.path(), "lamp.ies");
    let out = tmp.path().join("renamed.ies");
    lumen(tmp.path())
        .args([
            "convert",
            input.to_str().unwrap(),
            "--to",
            "ies",
            "-o",
            out.to_str().unwrap(),
            "--manufacturer",
            "Other Co",
        ])
        .assert()
        .success();
    let written = fs::read_to_string(out).unwrap();
    assert!(written.contains("[MANUFAC] Other Co"));
}

#[test]
fn lumen_convert_strict_fails_on_lossy_target() {
    let tmp = tempdir().unwrap();
    let input = write_ies(tmp.path(), "lamp.ies");
    lumen(tmp.path())
        .args(["convert", input.to_str().unwrap(), "--to", "cie", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("strict mode"));
    assert!(!tmp.path().join("lamp.cie").exists());
}

#[test]
fn lumen_convert_rejects_unknown_format() {
    let tmp = tempdir().unwrap();
    let input = write_ies(tmp.path(), "lamp.ies");
    lumen(tmp.path())
        .args(["convert", input.to_str().unwrap(), "--to", "dxf"])
        .assert()
        .failure();
}

#[test]
fn lumen_convert_syntax_error_exits_nonzero() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("broken.ies");
    fs::write(&input, "IESNA:LM-63-2002\n[MANUFAC] x\n").unwrap();
    lumen(tmp.path())
        .args(["convert", input.to_str().unwrap(), "--from", "ies", "--to", "ldt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax:ies.tilt_missing"));
}

#[test]
fn lumen_validate_prints_score() {
    let tmp = tempdir().unwrap();
    let input = write_ies(tmp.path(), "lamp.ies");
    lumen(tmp.path())
        .args(["validate", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid (score"));
}

#[test]
fn lumen_info_lists_formats() {
    let tmp = tempdir().unwrap();
    lumen(tmp.path())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("EULUMDAT").and(predicate::str::contains("CIE-102")));
    lumen(tmp.path())
        .args(["info", "cie"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(fixed)"));
}

#[test]
fn lumen_batch_writes_manifest() {
    let tmp = tempdir().unwrap();
    let inputs = tmp.path().join("in");
    fs::create_dir_all(&inputs).unwrap();
    write_ies(&inputs, "a.ies");
    write_ies(&inputs, "b.ies");
    let out = tmp.path().join("out");
    lumen(tmp.path())
        .args([
            "batch",
            inputs.to_str().unwrap(),
            "--to",
            "ldt",
            "-o",
            out.to_str().unwrap(),
            "--threads",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 ok, 0 failed"));
    assert!(out.join("a.ldt").exists());
    assert!(out.join("b.ldt").exists());
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("batch_manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["num_jobs"], 2);
    assert_eq!(manifest["by_source_format"]["ies"]["ok"], 2);
}

#[test]
fn lumen_batch_resume_reuses_manifest() {
    let tmp = tempdir().unwrap();
    let inputs = tmp.path().join("in");
    fs::create_dir_all(&inputs).unwrap();
    write_ies(&inputs, "a.ies");
    let out = tmp.path().join("out");
    let args = [
        "batch",
        inputs.to_str().unwrap(),
        "--to",
        "cie",
        "-o",
        out.to_str().unwrap(),
    ];
    lumen(tmp.path()).args(args).assert().success();
    lumen(tmp.path())
        .args(args)
        .arg("--resume")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 already converted"));
}

#[test]
fn lumen_config_sets_write_options() {
    let tmp = tempdir().unwrap();
    let input = write_ies(tmp.path(), "lamp.ies");
    let config = tmp.path().join("lumen.toml");
    fs::write(&config, "[conversion]\nline_ending = \"crlf\"\n").unwrap();
    lumen(tmp.path())
        .args([
            "--config",
            config.to_str().unwrap(),
            "convert",
            input.to_str().unwrap(),
            "--to",
            "ldt",
        ])
        .assert()
        .success();
    let written = fs::read_to_string(tmp.path().join("lamp.ldt")).unwrap();
    assert!(written.starts_with("Acme Lighting\r\n"));
}

#[test]
fn lumen_completions_bash() {
    let tmp = tempdir().unwrap();
    lumen(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lumen-cli"));
}
