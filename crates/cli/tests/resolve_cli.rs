use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use pinpoint_core::host::scripted::HostScript;
use pinpoint_core::model::Architecture;
use pinpoint_core::SignatureCatalog;
use predicates::prelude::*;
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    binary: PathBuf,
    script: PathBuf,
}

fn fixture(script: HostScript) -> Fixture {
    let temp = tempfile::tempdir().unwrap();
    let binary = temp.path().join("libflutter.so");
    fs::write(&binary, b"\x7fELF fake").unwrap();
    let script_path = temp.path().join("host.json");
    fs::write(&script_path, serde_json::to_string_pretty(&script).unwrap()).unwrap();
    Fixture { _temp: temp, binary, script: script_path }
}

fn search_command(arch: Architecture, index: usize) -> String {
    let catalog = SignatureCatalog::builtin();
    format!("/x {}", catalog.lookup(arch).unwrap()[index].host_encoding())
}

fn arm64_hit_script() -> HostScript {
    let mut script = HostScript::default();
    script.version = Some("radare2 5.9.8 0 @ linux-x86-64".into());
    script.responses.insert("iaj".into(), r#"{"bins":[{"arch":"arm","bits":64}]}"#.into());
    script.responses.insert(search_command(Architecture::Arm64, 1), "0x4000 hit1_0\n".into());
    script.responses.insert("afl. @ 0x4000".into(), "fcn.00004000\n".into());
    script
}

fn resolve(fx: &Fixture, extra: &[&str]) -> assert_cmd::assert::Assert {
    cargo_bin_cmd!("pinpoint")
        .env("PINPOINT_FAKE_HOST", &fx.script)
        .arg("resolve")
        .arg("--binary")
        .arg(&fx.binary)
        .args(extra)
        .assert()
}

#[test]
fn resolve_json_reports_found_function() {
    let fx = fixture(arm64_hit_script());
    let output = resolve(&fx, &["--json"]).success().get_output().stdout.clone();
    let body: serde_json::Value = serde_json::from_slice(&output).expect("resolve json");
    assert_eq!(body["found"], true);
    assert_eq!(body["address"], 0x4000);
    assert_eq!(body["functionId"], "fcn.00004000");
    assert_eq!(body["architecture"], "arm64");
    assert_eq!(body["pattern"], "arm64#1");
    assert_eq!(body["host"], "radare2");
    assert_eq!(body["hostVersion"], "5.9.8");
    assert_eq!(body["binarySha256"].as_str().map(str::len), Some(64));
    assert!(body["startedAt"].is_string());
}

#[test]
fn resolve_text_prints_pass_line() {
    let fx = fixture(arm64_hit_script());
    resolve(&fx, &[])
        .success()
        .stdout(predicate::str::contains("ssl_verify_peer_cert found at:"))
        .stdout(predicate::str::contains("0x4000"))
        .stdout(predicate::str::contains("fcn.00004000"));
}

#[test]
fn resolve_not_found_still_exits_successfully() {
    let mut script = HostScript::default();
    script.responses.insert("iaj".into(), r#"{"bins":[{"arch":"x86","bits":64}]}"#.into());
    let fx = fixture(script);
    resolve(&fx, &[])
        .success()
        .stdout(predicate::str::contains("ssl_verify_peer_cert not found."))
        .stdout(predicate::str::contains("No signature matched"));

    let output = resolve(&fx, &["--json"]).success().get_output().stdout.clone();
    let body: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(body["found"], false);
    assert_eq!(body["architecture"], "x86_64");
    assert!(body.get("address").is_none());
    assert!(body.get("functionId").is_none());
}

#[test]
fn resolve_uses_catalog_file_and_analysis_flag() {
    let mut script = HostScript::default();
    script.responses.insert("iaj".into(), r#"{"bins":[{"arch":"arm","bits":32}]}"#.into());
    // 2D E9 F. 4. -> 2de9f040:fffff0f0
    script.responses.insert("/x 2de9f040:fffff0f0".into(), "0x8000 hit0_0\n".into());
    script.responses.insert("afl. @ 0x8000".into(), "0x00008000 1 40 fcn.00008000\n".into());
    let fx = fixture(script);
    let catalog = fx.binary.with_file_name("sigs.yaml");
    fs::write(&catalog, "arm32:\n  - \"2D E9 F. 4.\"\n").unwrap();

    let output = resolve(&fx, &["--json", "--analysis", "aac", "--catalog", catalog.to_str().unwrap()])
        .success()
        .get_output()
        .stdout
        .clone();
    let body: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(body["found"], true);
    assert_eq!(body["functionId"], "0x8000");
}

#[test]
fn resolve_errors_for_missing_binary() {
    cargo_bin_cmd!("pinpoint")
        .arg("resolve")
        .arg("--binary")
        .arg(Path::new("does/not/exist.so"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Binary file does not exist"));
}

#[test]
fn resolve_rejects_unknown_host() {
    let fx = fixture(arm64_hit_script());
    resolve(&fx, &["--host", "ida"]).failure().stderr(predicate::str::contains("unknown host"));
}
