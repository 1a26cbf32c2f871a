//! End-to-end tests for the `finance` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn finance(data_dir: &TempDir, backend: &str) -> Command {
    let mut cmd = Command::cargo_bin("finance").unwrap();
    cmd.env_remove("FINANCE_LOG")
        .env_remove("FINANCE_PLANNER_BACKEND")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("--backend")
        .arg(backend);
    cmd
}

/// Pull the generated transaction ID out of command output
fn transaction_id(output: &[u8]) -> String {
    let text = String::from_utf8_lossy(output);
    text.lines()
        .find_map(|line| line.strip_prefix("Transaction: "))
        .map(|id| id.trim().to_string())
        .unwrap()
}

#[test]
fn test_add_then_list() {
    for backend in ["sqlite", "json"] {
        let temp_dir = TempDir::new().unwrap();

        finance(&temp_dir, backend)
            .args(["add-transaction", "--profile", "alice", "--label", "Salary"])
            .args(["--amount", "250000", "--tag", "income", "--tag", "monthly"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added transaction to 'alice'"));

        finance(&temp_dir, backend)
            .args(["add-transaction", "--profile", "alice", "--label", "Rent"])
            .args(["--amount", "-80000"])
            .assert()
            .success();

        finance(&temp_dir, backend)
            .args(["list-transactions", "--profile", "alice"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Profile: alice"))
            .stdout(predicate::str::contains("Incoming Transactions"))
            .stdout(predicate::str::contains("income, monthly"))
            .stdout(predicate::str::contains("End balance: 1700.00"));
    }
}

#[test]
fn test_update_transaction() {
    let temp_dir = TempDir::new().unwrap();

    let output = finance(&temp_dir, "sqlite")
        .args(["add-transaction", "--profile", "alice", "--label", "Shop"])
        .args(["--amount", "-500", "--tag", "a", "--tag", "b"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = transaction_id(&output.stdout);

    finance(&temp_dir, "sqlite")
        .args(["update-transaction", "--profile", "alice", "--id", &id, "--tag", "c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Label:       Shop"))
        .stdout(predicate::str::contains("Tags:        c\n"));

    finance(&temp_dir, "sqlite")
        .args(["update-transaction", "--profile", "bob", "--id", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[UnknownProfile]"));
}

#[test]
fn test_stats_and_rename() {
    let temp_dir = TempDir::new().unwrap();

    finance(&temp_dir, "json")
        .args(["add", "-p", "alice", "-l", "Gift", "-a", "2000"])
        .assert()
        .success();

    finance(&temp_dir, "json")
        .args(["rename-profile", "--profile", "alice", "--name", "bob"])
        .assert()
        .success();

    finance(&temp_dir, "json")
        .args(["stats", "--profile", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions: 1"))
        .stdout(predicate::str::contains("End balance:  20.00"));
}

#[test]
fn test_unknown_profile_fails() {
    let temp_dir = TempDir::new().unwrap();
    finance(&temp_dir, "sqlite")
        .args(["list-transactions", "--profile", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("profile not found: nobody"));
}

#[test]
fn test_zero_amount_rejected() {
    let temp_dir = TempDir::new().unwrap();
    finance(&temp_dir, "sqlite")
        .args(["add-transaction", "--profile", "alice", "--label", "Zero", "--amount", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("transaction amount must not be 0"));
}

#[test]
fn test_config_save() {
    let temp_dir = TempDir::new().unwrap();
    finance(&temp_dir, "json")
        .args(["config", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend:   json"));

    assert!(temp_dir.path().join("config.json").exists());
}
