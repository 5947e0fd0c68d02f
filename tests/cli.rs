use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const BIN_NAME: &str = "expense-ledger";

fn ledger(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
    cmd.env("EXPENSE_LEDGER_DATA_DIR", dir.path())
        .env_remove("EXPENSE_LEDGER_DB")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn add_then_list_shows_total() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .args(["add", "2024-01-15", "food", "12.50"])
        .assert()
        .success()
        .stdout(contains("Expense added successfully!"));

    ledger(&dir)
        .args(["add", "2024-01-16", "transport", "7.5"])
        .assert()
        .success();

    ledger(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("food").and(contains("transport")))
        .stdout(contains("Total Expense: 20.00"));
}

#[test]
fn bad_date_is_rejected() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .args(["add", "2024-13-40", "food", "3"])
        .assert()
        .failure()
        .stderr(contains("Date 2024-13-40 is not in the correct format (YYYY-MM-DD)"));

    ledger(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Total Expense: 0.00"));
}

#[test]
fn delete_without_id_asks_for_selection() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .arg("delete")
        .assert()
        .failure()
        .stderr(contains("Please select an expense to delete!"));
}

#[test]
fn delete_by_id_removes_row() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .args(["add", "2024-01-15", "food", "10"])
        .assert()
        .success()
        .stdout(contains("(#1)"));

    ledger(&dir)
        .args(["delete", "1"])
        .assert()
        .success()
        .stdout(contains("Expense deleted successfully!"));

    ledger(&dir)
        .args(["delete", "1"])
        .assert()
        .failure()
        .stderr(contains("Expense #1 no longer exists."));
}

#[test]
fn budget_persists_and_warns_when_exceeded() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .args(["budget", "set", "100", "2024-01-01", "2024-01-31"])
        .assert()
        .success()
        .stdout(contains("Maximum Budget: 100.00 from 2024-01-01 to 2024-01-31"))
        .stdout(contains("Remaining Budget: 100.00"));

    ledger(&dir)
        .args(["add", "2024-01-15", "rent", "150"])
        .assert()
        .success()
        .stdout(contains("Warning: You've exceeded your budget by 50.00!"));

    ledger(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("exceeded your budget by 50.00"));
}

#[test]
fn status_without_budget() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("No budget set"));
}

#[test]
fn chart_groups_by_category() {
    let dir = TempDir::new().unwrap();

    for (date, category, amount) in [
        ("2024-01-05", "food", "20"),
        ("2024-01-09", "food", "5"),
        ("2024-01-10", "rent", "100"),
    ] {
        ledger(&dir)
            .args(["add", date, category, amount])
            .assert()
            .success();
    }

    ledger(&dir)
        .arg("chart")
        .assert()
        .success()
        .stdout(contains("Total Expenses by Category (2024-01-05 to 2024-01-10)"))
        .stdout(contains("25.00").and(contains("100.00")));
}

#[test]
fn export_then_import_into_fresh_ledger() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let csv_path = source.path().join("expenses.csv");

    ledger(&source)
        .args(["add", "2024-03-01", "books", "42"])
        .assert()
        .success();

    ledger(&source)
        .arg("export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(contains("Exported 1 expenses"));

    let written = std::fs::read_to_string(&csv_path).unwrap();
    assert!(written.starts_with("date,category,amount"));

    ledger(&target)
        .arg("import")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(contains("Inserted: 1 expenses"));

    ledger(&target)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("books").and(contains("Total Expense: 42.00")));
}

#[test]
fn config_reports_data_dir() {
    let dir = TempDir::new().unwrap();

    ledger(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(contains("persist_budget"));

    assert!(dir.path().join("config.json").exists());
}
