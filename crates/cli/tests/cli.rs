//! End-to-end tests for the duviz binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, len: usize) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![b'x'; len]).unwrap();
}

fn sample_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "big/one.bin", 300);
    write(dir.path(), "small/two.bin", 100);
    dir
}

fn duviz() -> Command {
    let mut cmd = Command::cargo_bin("duviz").unwrap();
    cmd.env_remove("COLUMNS").env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let out = cmd.output().unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8(out.stdout).unwrap()
}

#[test]
fn summary_lists_children_largest_first() {
    let dir = sample_tree();
    let out = stdout_of(duviz().arg(dir.path()).args(["--view", "summary"]));
    let big = out.find("`-300 B (300 B): big").expect(&out);
    let small = out.find("`-100 B (100 B): small").expect(&out);
    assert!(big < small);
    assert!(out.starts_with("+400 B (400 B): "));
}

#[test]
fn blocks_fill_the_requested_width() {
    let dir = sample_tree();
    let out = stdout_of(duviz().arg(dir.path()).args(["--width", "40"]));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "_".repeat(40));
    assert_eq!(lines.len(), 1 + 3 + 3);
    assert!(lines.iter().all(|l| l.chars().count() == 40), "{out}");
}

#[test]
fn width_can_come_from_columns() {
    let dir = sample_tree();
    let out = stdout_of(duviz().env("COLUMNS", "24").arg(dir.path()));
    assert_eq!(out.lines().next().unwrap(), "_".repeat(24));
}

#[test]
fn allocation_unit_rounds_sizes_up() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "f", 10);
    duviz()
        .arg(dir.path())
        .args(["--view", "summary", "--allocation-unit", "1KiB"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10 B (1.00 KiB):"));
}

#[test]
fn invalid_path_is_skipped_with_warning() {
    let dir = sample_tree();
    duviz()
        .arg(dir.path().join("missing"))
        .arg(dir.path())
        .args(["--view", "summary"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not a valid path"))
        .stdout(predicate::str::contains("big"));
}

#[test]
fn emitted_records_render_like_a_scan() {
    let dir = sample_tree();
    let records = stdout_of(duviz().arg(dir.path()).arg("--emit-records"));
    assert_eq!(records.lines().count(), 3);
    assert!(records.lines().all(|l| l.split('|').count() == 8));

    let file = dir.path().join("records.txt");
    fs::write(&file, &records).unwrap();
    let from_file = stdout_of(duviz().arg("--records").arg(&file).args(["--view", "summary"]));
    let scanned = stdout_of(duviz().arg(dir.path()).args(["--view", "summary"]));
    // The records file itself is part of the second scan.
    assert!(scanned.contains("big"));
    assert!(from_file.contains("`-300 B (300 B): big"));
    assert!(from_file.contains("`-100 B (100 B): small"));
}

#[test]
fn records_from_stdin_skip_malformed_lines() {
    let input = "\
1|2|3|4|/data/bad
1|500|500|a.bin|500|a.bin|10.0|/data
2|70|70|b.bin|40|c.bin|5.5|/data/sub
";
    duviz()
        .args(["--records", "-", "--view", "dump"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("0: 3 files, 2 folders, 570 B (570 B) '/data'"))
        .stdout(predicate::str::contains("largest: 'a.bin' (500 B)"))
        .stdout(predicate::str::contains("oldest:  'c.bin'"))
        .stderr(predicate::str::contains("malformed"));
}

#[test]
fn records_listing_children_first_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("rec.txt");
    fs::write(
        &file,
        "1|50|50|a|50|a|2.0|/data/sub\n2|300|300|b|250|b|1.0|/data\n",
    )
    .unwrap();
    duviz()
        .arg("--records")
        .arg(&file)
        .args(["--view", "dump"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0: 3 files, 2 folders, 350 B (350 B) '/data'"))
        .stdout(predicate::str::contains("    1: 1 files, 1 folders, 50 B (50 B) 'sub'"));
}

#[test]
fn records_with_nothing_usable_fail() {
    duviz()
        .args(["--records", "-"])
        .write_stdin("not|a|record\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no usable records"));
}

#[test]
fn records_and_emit_conflict() {
    duviz()
        .args(["--records", "-", "--emit-records"])
        .assert()
        .failure();
}
