use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn cashback(data_dir: &Path, storage: &str) -> Command {
    let mut cmd = Command::cargo_bin("cashback").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("CASHBACK_STORAGE")
        .env_remove("CASHBACK_DATA_DIR")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--storage")
        .arg(storage);
    cmd
}

#[test]
fn add_then_list_on_every_backend() {
    for storage in ["sqlite", "json", "xml"] {
        let dir = TempDir::new().unwrap();
        cashback(dir.path(), storage)
            .args(["add", "Alfa", "Black", "Fuel", "5", "--date", "2024-06-01"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added card 1"));

        cashback(dir.path(), storage)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("Alfa").and(predicate::str::contains("Fuel")));
    }
}

#[test]
fn naked_invocation_lists_cards() {
    let dir = TempDir::new().unwrap();
    cashback(dir.path(), "json")
        .assert()
        .success()
        .stdout(predicate::str::contains("No cards found."));
}

#[test]
fn best_picks_highest_active_rate() {
    let dir = TempDir::new().unwrap();
    for (bank, rate) in [("A", "5"), ("B", "15"), ("C", "3")] {
        cashback(dir.path(), "json")
            .args(["add", bank, "Card", "Cafe", rate])
            .assert()
            .success();
    }
    cashback(dir.path(), "json")
        .args(["best", "cafe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B Card").and(predicate::str::contains("15%")));
}

#[test]
fn update_records_history() {
    let dir = TempDir::new().unwrap();
    cashback(dir.path(), "xml")
        .args(["add", "Alfa", "Black", "Fuel", "5"])
        .assert()
        .success();
    cashback(dir.path(), "xml")
        .args(["update", "1", "--category", "Taxi", "--cashback", "7"])
        .assert()
        .success();

    cashback(dir.path(), "xml")
        .args(["history", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Taxi").and(predicate::str::contains("Fuel")));
}

#[test]
fn expiring_mark_flips_due_cards() {
    let dir = TempDir::new().unwrap();
    cashback(dir.path(), "sqlite")
        .args(["add", "Alfa", "Black", "Fuel", "5", "--date", "2024-01-01"])
        .assert()
        .success();
    cashback(dir.path(), "sqlite")
        .args(["expiring", "--date", "2024-01-01", "--mark"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked 1 card(s) as expired"));

    cashback(dir.path(), "sqlite")
        .args(["list", "--status", "expired"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EXPIRED"));
}

#[test]
fn invalid_card_is_rejected() {
    let dir = TempDir::new().unwrap();
    cashback(dir.path(), "json")
        .args(["add", "Alfa", "Black", "Fuel", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:").and(predicate::str::contains("cashback")));
}

#[test]
fn show_unknown_card_fails() {
    let dir = TempDir::new().unwrap();
    cashback(dir.path(), "json")
        .args(["show", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("card 42 not found"));
}

#[test]
fn unknown_storage_falls_back_to_sqlite() {
    let dir = TempDir::new().unwrap();
    cashback(dir.path(), "csv")
        .arg("banks")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown storage kind"))
        .stdout(predicate::str::contains("No banks yet."));
    assert!(dir.path().join("sqlite").join("cashback.db").exists());
}
