use predicates::prelude::*;

mod common;

#[test]
fn test_remove_box_drops_the_configuration() {
    let ctx = common::boxhive();
    ctx.cmd().args(["list", "alpha"]).assert().success();

    ctx.cmd()
        .args(["remove-box", "alpha"])
        .assert()
        .success()
        .stdout("alpha\n");

    ctx.cmd()
        .args(["list", "--quiet"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_remove_box_requires_an_emptied_root() {
    let ctx = common::boxhive();
    ctx.seed_content("alpha", &[("drive/a.txt", "a")]);
    ctx.cmd().args(["list", "alpha"]).assert().success();

    ctx.cmd()
        .args(["remove-box", "alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("emptied"));

    ctx.cmd().args(["clean", "alpha"]).assert().success();
    ctx.cmd().args(["remove-box", "alpha"]).assert().success();
}

#[test]
fn test_remove_box_unknown_box() {
    let ctx = common::boxhive();

    ctx.cmd()
        .args(["remove-box", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown box"));
}
