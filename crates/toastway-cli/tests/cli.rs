use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const SPOOL_ENV: &str = "TOASTWAY_SPOOL_DIR";

fn run(spool: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_toastway"));
    cmd.env(SPOOL_ENV, spool);
    cmd.args(args);
    cmd.output().expect("run toastway CLI")
}

fn run_ok(spool: &Path, args: &[&str]) -> String {
    let output = run(spool, args);
    if !output.status.success() {
        panic!(
            "CLI command {:?} failed: status={:?}\nstdout={}\nstderr={}",
            args,
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn render_strips_template_wrappers_by_default() {
    let tmp = TempDir::new().unwrap();
    let stdout = run_ok(
        tmp.path(),
        &[
            "render",
            "--title",
            "{title}",
            "--line",
            "plain body",
            "--compact",
        ],
    );
    assert!(stdout.contains("<text>title</text>"), "stdout: {stdout}");
    assert!(stdout.contains("plain body"), "stdout: {stdout}");
    assert!(!stdout.contains('{'), "stdout: {stdout}");
}

#[test]
fn render_template_keeps_placeholders_and_reports_keys() {
    let tmp = TempDir::new().unwrap();
    let output = run(
        tmp.path(),
        &["render", "--title", "{title}", "--template", "--compact"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("<text>{title}</text>"), "stdout: {stdout}");
    assert!(stderr.contains("binding keys: title"), "stderr: {stderr}");
}

#[test]
fn render_urgent_patches_the_root() {
    let tmp = TempDir::new().unwrap();
    let stdout = run_ok(
        tmp.path(),
        &["render", "--title", "Hi", "--urgent", "--compact"],
    );
    assert!(stdout.contains("urgency=\"high\""), "stdout: {stdout}");
}

#[test]
fn send_then_history_round_trip() {
    let tmp = TempDir::new().unwrap();
    let stdout = run_ok(
        tmp.path(),
        &[
            "send",
            "--title",
            "Build done",
            "--id",
            "build-42",
            "--sequence",
            "1",
        ],
    );
    assert!(
        stdout.contains("posted build-42~build-42"),
        "stdout: {stdout}"
    );

    let json = run_ok(tmp.path(), &["history", "--id", "build-42", "--json"]);
    let records: Value = serde_json::from_str(json.trim()).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["sequence"], 1);
    assert_eq!(records[0]["identity"]["tag"], "build-42");
    let markup = records[0]["markup"].as_str().unwrap();
    assert!(markup.contains("Build done"), "markup: {markup}");
}

#[test]
fn update_merges_data_and_rejects_stale_sequences() {
    let tmp = TempDir::new().unwrap();
    run_ok(
        tmp.path(),
        &[
            "send",
            "--title",
            "Job",
            "--id",
            "job",
            "--data",
            "status=running",
            "--sequence",
            "2",
        ],
    );

    let stdout = run_ok(
        tmp.path(),
        &[
            "update",
            "--id",
            "job",
            "--data",
            "status=done",
            "--sequence",
            "3",
        ],
    );
    assert!(stdout.contains("updated job~job"), "stdout: {stdout}");

    // Same sequence again is not an advance.
    let stale = run(
        tmp.path(),
        &[
            "update",
            "--id",
            "job",
            "--data",
            "status=late",
            "--sequence",
            "3",
        ],
    );
    assert!(!stale.status.success());

    let json = run_ok(tmp.path(), &["history", "--json"]);
    let records: Value = serde_json::from_str(json.trim()).unwrap();
    assert_eq!(records[0]["data"]["status"], "done");
    assert_eq!(records[0]["sequence"], 3);
}

#[test]
fn update_unknown_id_fails() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["update", "--id", "ghost", "--data", "x=y"]);
    assert!(!output.status.success());
}

#[test]
fn remove_all_clears_the_spool() {
    let tmp = TempDir::new().unwrap();
    run_ok(tmp.path(), &["send", "--title", "One", "--id", "a"]);
    run_ok(tmp.path(), &["send", "--title", "Two", "--id", "b"]);

    let stdout = run_ok(tmp.path(), &["remove", "--all"]);
    assert!(stdout.contains("removed 2"), "stdout: {stdout}");

    let listing = run_ok(tmp.path(), &["history"]);
    assert!(listing.contains("spool is empty"), "stdout: {listing}");
}

#[test]
fn remove_requires_exactly_one_selector() {
    let tmp = TempDir::new().unwrap();
    assert!(!run(tmp.path(), &["remove"]).status.success());
    assert!(
        !run(tmp.path(), &["remove", "--all", "--id", "a"])
            .status
            .success()
    );
}

#[test]
fn send_template_data_switches_to_template_mode() {
    let tmp = TempDir::new().unwrap();
    run_ok(
        tmp.path(),
        &[
            "send",
            "--title",
            "{headline}",
            "--id",
            "news",
            "--data",
            "headline=Forecast",
        ],
    );

    let json = run_ok(tmp.path(), &["history", "--id", "news", "--json"]);
    let records: Value = serde_json::from_str(json.trim()).unwrap();
    let markup = records[0]["markup"].as_str().unwrap();
    assert!(markup.contains("{headline}"), "markup: {markup}");
    assert_eq!(records[0]["data"]["headline"], "Forecast");
}
