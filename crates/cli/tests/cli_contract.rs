use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;

fn scriptdesk(data_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("scriptdesk");
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn stdout_of(data_dir: &Path, args: &[&str]) -> String {
    let output = scriptdesk(data_dir).args(args).assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("stdout should be utf-8").trim().to_owned()
}

fn json_of(data_dir: &Path, args: &[&str]) -> Value {
    serde_json::from_str(&stdout_of(data_dir, args)).expect("stdout should contain valid json")
}

#[test]
fn show_emits_stable_json_contract_for_fresh_document() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let value = json_of(temp.path(), &["show"]);

    insta::assert_json_snapshot!("cli_show_fresh_document", value);
}

#[test]
fn quad_window_shifts_only_when_pages_remain() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let dir = temp.path();

    for expected in ["1", "2", "3"] {
        assert_eq!(stdout_of(dir, &["add-page"]), expected);
    }

    let view = json_of(dir, &["view", "mode", "quad"]);
    assert_eq!(view["windowStart"], 0);
    assert_eq!(view["visible"], serde_json::json!([0, 1, 2, 3]));
    assert_eq!(view["canShiftNext"], false);

    let view = json_of(dir, &["view", "shift", "next"]);
    assert_eq!(view["windowStart"], 0);

    stdout_of(dir, &["add-page"]);
    let view = json_of(dir, &["view", "shift", "next"]);
    assert_eq!(view["windowStart"], 1);
    assert_eq!(view["visible"], serde_json::json!([1, 2, 3, 4]));

    let view = json_of(dir, &["view", "mode", "double"]);
    assert_eq!(view["windowStart"], 0);
}

#[test]
fn new_note_lands_at_default_offset() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let dir = temp.path();

    stdout_of(dir, &["add-page"]);
    stdout_of(dir, &["add-page"]);
    let id = stdout_of(dir, &["note", "add", "2"]);

    let notes = json_of(dir, &["note", "list", "2"]);
    assert_eq!(notes[0]["id"], Value::String(id));
    assert_eq!(notes[0]["content"], "");
    assert_eq!(notes[0]["position"], serde_json::json!({ "x": 40.0, "y": 40.0 }));
}

#[test]
fn drag_clamps_note_to_non_negative_coordinates() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let dir = temp.path();

    let id = stdout_of(dir, &["note", "add", "0"]);
    let moved = stdout_of(dir, &["note", "drag", "0", &id, "--from", "100,100", "--to", "-400,130"]);
    assert_eq!(moved, "ok");

    let notes = json_of(dir, &["note", "list", "0"]);
    assert_eq!(notes[0]["position"], serde_json::json!({ "x": 0.0, "y": 70.0 }));
}

#[test]
fn restore_discards_edits_made_after_save() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let dir = temp.path();

    stdout_of(dir, &["write", "0", "A"]);
    stdout_of(dir, &["add-page"]);
    stdout_of(dir, &["write", "1", "B"]);
    stdout_of(dir, &["save", "Draft 1"]);
    stdout_of(dir, &["write", "0", "A-edited"]);

    assert_eq!(stdout_of(dir, &["restore", "--title", "Draft 1"]), "ok");

    let state = json_of(dir, &["show"]);
    assert_eq!(state["pages"][0]["content"], "A");
    assert_eq!(state["pages"][1]["content"], "B");
    assert_eq!(state["versions"], 1);

    let history = json_of(dir, &["history"]);
    assert_eq!(history[0]["title"], "Draft 1");
    assert_eq!(history[0]["pages"], 2);
}

#[test]
fn tool_appends_to_every_visible_page() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let dir = temp.path();

    stdout_of(dir, &["add-page"]);
    stdout_of(dir, &["add-page"]);
    json_of(dir, &["view", "mode", "double"]);
    stdout_of(dir, &["tool", "transition"]);

    let state = json_of(dir, &["show"]);
    assert_eq!(state["pages"][0]["content"], "\nCUT TO:\n");
    assert_eq!(state["pages"][1]["content"], "\nCUT TO:\n");
    assert_eq!(state["pages"][2]["content"], "");
}

#[test]
fn out_of_range_edits_are_reported_unchanged() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    assert_eq!(stdout_of(temp.path(), &["write", "9", "lost"]), "unchanged");
    assert_eq!(stdout_of(temp.path(), &["delete-page", "0"]), "unchanged");
}

#[test]
fn restore_fails_for_unknown_version() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    scriptdesk(temp.path())
        .args(["restore", "--title", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("version not found"));
}

#[test]
fn corrupt_history_blob_falls_back_to_empty() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let dir = temp.path();

    stdout_of(dir, &["write", "0", "survives"]);
    std::fs::write(dir.join("documents").join("default").join("versionHistory.json"), b"{oops")
        .expect("write should succeed");

    let state = json_of(dir, &["show"]);
    assert_eq!(state["versions"], 0);
    assert_eq!(state["pages"][0]["content"], "survives");
}

#[test]
fn documents_are_kept_apart() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let dir = temp.path();

    stdout_of(dir, &["--doc", "pilot", "add-page"]);

    let pilot = json_of(dir, &["--doc", "pilot", "show"]);
    let other = json_of(dir, &["--doc", "finale", "show"]);
    assert_eq!(pilot["pages"].as_array().map(Vec::len), Some(2));
    assert_eq!(other["pages"].as_array().map(Vec::len), Some(1));
}

#[test]
fn preferences_set_initial_view_mode() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let dir = temp.path();

    let prefs = json_of(dir, &["prefs", "--default-view", "all", "--stagger", "true"]);
    assert_eq!(prefs["defaultViewMode"], "all");

    let state = json_of(dir, &["show"]);
    assert_eq!(state["view"]["mode"], "all");
}

#[test]
fn invalid_document_id_is_rejected() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    scriptdesk(temp.path())
        .args(["--doc", "../escape", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid document id"));
}

#[test]
fn version_prints_package_version() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    scriptdesk(temp.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
