use predicates::prelude::*;

mod common;

#[test]
fn test_take_prints_the_new_id() {
    let ctx = common::boxhive();
    ctx.seed_content("work", &[("drive/a.txt", "a"), ("RegHive", "hive")]);

    ctx.cmd()
        .args(["take", "work", "before upgrade"])
        .assert()
        .success()
        .stdout("1\n");

    // Live content frozen under the snapshot folder.
    assert!(ctx.box_root("work").join("snapshot-1/drive/a.txt").exists());
    assert!(!ctx.box_root("work").join("drive").exists());
}

#[test]
fn test_take_allocates_sequential_ids() {
    let ctx = common::boxhive();
    ctx.seed_content("work", &[("drive/a.txt", "a")]);

    ctx.cmd().args(["take", "work", "one"]).assert().success().stdout("1\n");
    ctx.cmd().args(["take", "work", "two"]).assert().success().stdout("2\n");
}

#[test]
fn test_take_rejects_invalid_box_names() {
    let ctx = common::boxhive();

    ctx.cmd()
        .args(["take", "bad/name", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid box name"));
}
