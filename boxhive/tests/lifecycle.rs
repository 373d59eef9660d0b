//! Integration tests for box lifecycle: settings seeding, cleaning, and the
//! process-confirmation gate.

use std::sync::Arc;

use boxhive::{Confirm, LocalFolderOps, OpStatus, ProcessMonitor};
use boxhive_test_utils::{read_file, write_tree, StaticProcessMonitor, TestHome};

#[test]
fn test_first_open_seeds_box_settings() {
    let home = TestHome::new();
    home.open_box("alpha");

    let settings = read_file(&home.runtime().home_dir().join("boxhive.ini"));
    assert!(settings.contains("[alpha]"));
    assert!(settings.contains("ConfigLevel=7"));
    assert!(settings.contains("AutoRecover=n"));
    assert!(settings.contains("BlockNetworkFiles=y"));
}

#[test]
fn test_delete_protection_round_trips() {
    let home = TestHome::new();
    let hive_box = home.open_box("alpha");
    assert!(!hive_box.is_delete_protected());

    hive_box.set_delete_protected(true).unwrap();
    assert!(hive_box.is_delete_protected());
    let settings = read_file(&home.runtime().home_dir().join("boxhive.ini"));
    assert!(settings.contains("NeverDelete=y"));

    hive_box.set_delete_protected(false).unwrap();
    assert!(!hive_box.is_delete_protected());
}

#[tokio::test]
async fn test_clean_deletes_box_content() {
    let home = TestHome::new();
    let hive_box = home.open_box("alpha");
    write_tree(
        hive_box.root(),
        &[("drive/app.txt", "data"), ("RegHive", "hive")],
    );
    hive_box.take_snapshot("keep", Confirm::Require).unwrap();

    let mut handle = hive_box.clean(Confirm::Require).unwrap();
    assert_eq!(handle.wait().await, OpStatus::Ok);
    assert!(!hive_box.root().exists());

    // A cleaned box starts over from nothing.
    assert!(hive_box.snapshots().unwrap().is_empty());
    let fresh = hive_box.take_snapshot("fresh", Confirm::Require).unwrap();
    assert_eq!(fresh.as_str(), "1");
}

#[tokio::test]
async fn test_clean_respects_delete_protection() {
    let home = TestHome::new();
    let hive_box = home.open_box("alpha");
    write_tree(hive_box.root(), &[("drive/app.txt", "data")]);

    hive_box.set_delete_protected(true).unwrap();
    let err = hive_box.clean(Confirm::Require).unwrap_err();
    assert!(err.to_string().contains("delete protection"));
    assert!(hive_box.root().exists());

    hive_box.set_delete_protected(false).unwrap();
    let mut handle = hive_box.clean(Confirm::Require).unwrap();
    assert_eq!(handle.wait().await, OpStatus::Ok);
    assert!(!hive_box.root().exists());
}

#[tokio::test]
async fn test_busy_box_clean_requires_confirmation() {
    let monitor = Arc::new(StaticProcessMonitor::new(2));
    let home = TestHome::with_collaborators(Arc::new(LocalFolderOps::new()), monitor.clone());
    let hive_box = home.open_box("alpha");
    write_tree(hive_box.root(), &[("drive/app.txt", "data")]);

    let err = hive_box.clean(Confirm::Require).unwrap_err();
    assert!(err.is_confirmation_required());
    assert!(hive_box.root().exists());

    // Confirmation terminates the processes and proceeds.
    let mut handle = hive_box.clean(Confirm::Confirmed).unwrap();
    assert_eq!(handle.wait().await, OpStatus::Ok);
    assert!(!hive_box.root().exists());
    assert_eq!(monitor.active_process_count("alpha"), 0);
    assert_eq!(hive_box.process_count(), 0);
}

#[test]
fn test_process_count_reflects_monitor() {
    let monitor = Arc::new(StaticProcessMonitor::new(3));
    let home = TestHome::with_collaborators(Arc::new(LocalFolderOps::new()), monitor.clone());
    let hive_box = home.open_box("alpha");

    assert_eq!(hive_box.process_count(), 3);
    assert_eq!(hive_box.cached_process_count(), 3);

    monitor.set_count(0);
    assert_eq!(hive_box.process_count(), 0);
    assert_eq!(hive_box.cached_process_count(), 0);
}

#[tokio::test]
async fn test_box_retirement_flow() {
    let home = TestHome::new();
    let hive_box = home.open_box("alpha");
    write_tree(hive_box.root(), &[("drive/app.txt", "data")]);
    hive_box.take_snapshot("history", Confirm::Require).unwrap();

    // The configuration cannot be dropped while content exists.
    let err = home.runtime().remove_box("alpha").unwrap_err();
    assert!(err.to_string().contains("emptied"));

    let mut handle = hive_box.clean(Confirm::Require).unwrap();
    assert_eq!(handle.wait().await, OpStatus::Ok);

    home.runtime().remove_box("alpha").unwrap();
    assert!(home.runtime().list_box_names().unwrap().is_empty());
    let settings = read_file(&home.runtime().home_dir().join("boxhive.ini"));
    assert!(!settings.contains("[alpha]"));
}

#[test]
fn test_rename_box_after_clean_keeps_settings_group() {
    let home = TestHome::new();
    let hive_box = home.open_box("alpha");
    hive_box.set_delete_protected(true).unwrap();

    // No content was ever written, so the root does not exist yet and the
    // rename applies immediately, carrying the settings over.
    let renamed = home.runtime().rename_box("alpha", "beta two").unwrap();
    assert_eq!(renamed, "beta_two");

    let settings = read_file(&home.runtime().home_dir().join("boxhive.ini"));
    assert!(settings.contains("[beta_two]"));
    assert!(!settings.contains("[alpha]"));
    // The carried-over group still holds the protection flag.
    let beta = home.open_box("beta_two");
    assert!(beta.is_delete_protected());
}
