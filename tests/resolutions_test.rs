//! Integration tests for `lichen resolutions`.

mod common;

use assert_cmd::Command;
use common::{write_file, write_restricted_corpus};
use predicates::prelude::*;
use tempfile::TempDir;

fn lichen() -> Command {
    Command::cargo_bin("lichen").unwrap()
}

#[test]
fn test_bottom_up_dump() {
    let tmp = TempDir::new().unwrap();
    write_restricted_corpus(tmp.path());
    lichen()
        .current_dir(tmp.path())
        .args(["resolutions", "gplBin.meta_lic"])
        .assert()
        .success()
        .stdout(
            "apacheLib.meta_lic apacheLib.meta_lic notice\n\
             gplBin.meta_lic apacheLib.meta_lic notice\n\
             gplBin.meta_lic gplBin.meta_lic restricted\n",
        );
}

#[test]
fn test_top_down_restricted_reaches_the_library() {
    let tmp = TempDir::new().unwrap();
    write_restricted_corpus(tmp.path());
    lichen()
        .current_dir(tmp.path())
        .args(["resolutions", "-c", "restricted", "gplBin.meta_lic"])
        .assert()
        .success()
        .stdout(
            "apacheLib.meta_lic gplBin.meta_lic restricted\n\
             gplBin.meta_lic gplBin.meta_lic restricted\n",
        );
}

#[test]
fn test_multiple_conditions_are_joined() {
    let tmp = TempDir::new().unwrap();
    write_restricted_corpus(tmp.path());
    let assert = lichen()
        .current_dir(tmp.path())
        .args([
            "resolutions",
            "-c",
            "restricted",
            "-c",
            "notice",
            "gplBin.meta_lic",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("gplBin.meta_lic apacheLib.meta_lic notice"));
    assert!(stdout.contains("apacheLib.meta_lic gplBin.meta_lic restricted"));
}

#[test]
fn test_unknown_condition_fails() {
    let tmp = TempDir::new().unwrap();
    write_restricted_corpus(tmp.path());
    lichen()
        .current_dir(tmp.path())
        .args(["resolutions", "-c", "copyleft", "gplBin.meta_lic"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("copyleft"));
}

#[test]
fn test_dynamic_only_edge_screens_lgpl_condition() {
    let tmp = TempDir::new().unwrap();
    write_file(
        tmp.path(),
        "bin.meta_lic",
        &common::bin_meta("bin", "Bin", "notice", &[("lgplLib", "dynamic")]),
    );
    write_file(
        tmp.path(),
        "lgplLib.meta_lic",
        &common::lib_meta("lgplLib", "LGPL", "restricted_allows_dynamic_linking", &[]),
    );
    // the condition neither reaches the binary nor flows back down
    lichen()
        .current_dir(tmp.path())
        .args(["resolutions", "bin.meta_lic"])
        .assert()
        .success()
        .stdout(
            "bin.meta_lic bin.meta_lic notice\n\
             lgplLib.meta_lic lgplLib.meta_lic restricted_allows_dynamic_linking\n",
        );
}

#[test]
fn test_determinism_across_runs() {
    let tmp = TempDir::new().unwrap();
    write_restricted_corpus(tmp.path());
    let run = || {
        let assert = lichen()
            .current_dir(tmp.path())
            .args(["resolutions", "-c", "shared", "gplBin.meta_lic"])
            .assert()
            .success();
        assert.get_output().stdout.clone()
    };
    assert_eq!(run(), run());
}
