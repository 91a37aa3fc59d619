use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn molt() -> Command {
    Command::cargo_bin("molt").unwrap()
}

#[test]
fn plan_then_apply_renames_a_single_file() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = dir.child("draft-notes.txt");
    file.touch().unwrap();

    molt()
        .current_dir(&dir)
        .args(["plan", "draft-notes.txt", "--rule", "sub:draft:final"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 to rename"));

    molt().current_dir(&dir).arg("apply").assert().success().stdout(predicate::str::contains("1 renamed"));

    dir.child("final-notes.txt").assert(predicate::path::exists());
    file.assert(predicate::path::missing());
}

#[test]
fn apply_in_place_skips_the_saved_plan_file() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("report_v1.csv").touch().unwrap();

    molt()
        .current_dir(&dir)
        .args(["apply", "--in-place", "report_v1.csv", "--rule", "sub:v1:v2"])
        .assert()
        .success();

    dir.child("report_v2.csv").assert(predicate::path::exists());
}

#[test]
fn plan_dry_run_does_not_write_a_plan_file() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("a.txt").touch().unwrap();

    molt().current_dir(&dir).args(["plan", "a.txt", "--rule", "sub:a:b", "--dry-run"]).assert().success();

    dir.child(".molt/plan.json").assert(predicate::path::missing());
    dir.child("a.txt").assert(predicate::path::exists());
}

#[test]
fn only_rules_prints_candidates_without_touching_the_filesystem() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("a.txt").touch().unwrap();

    molt()
        .current_dir(&dir)
        .args(["plan", "a.txt", "--rule", "sub:a:b", "--only-rules"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-> b.txt"));

    dir.child("a.txt").assert(predicate::path::exists());
    dir.child("b.txt").assert(predicate::path::missing());
}
