use predicates::prelude::*;

mod common;

#[test]
fn test_rename_normalizes_spaces() {
    let ctx = common::boxhive();
    // Listing a box registers its configuration without creating content.
    ctx.cmd().args(["list", "alpha"]).assert().success();

    ctx.cmd()
        .args(["rename", "alpha", "beta two"])
        .assert()
        .success()
        .stdout("beta_two\n");

    ctx.cmd()
        .args(["list", "--quiet"])
        .assert()
        .success()
        .stdout("beta_two\n");
}

#[test]
fn test_rename_requires_an_emptied_box() {
    let ctx = common::boxhive();
    ctx.seed_content("alpha", &[("drive/a.txt", "a")]);
    ctx.cmd().args(["list", "alpha"]).assert().success();

    ctx.cmd()
        .args(["rename", "alpha", "beta"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("emptied"));

    // Clean first, then the rename goes through.
    ctx.cmd().args(["clean", "alpha"]).assert().success();
    ctx.cmd().args(["rename", "alpha", "beta"]).assert().success();
}

#[test]
fn test_rename_unknown_box() {
    let ctx = common::boxhive();

    ctx.cmd()
        .args(["rename", "ghost", "beta"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown box"));
}
