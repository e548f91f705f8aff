use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cashback(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cashback").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn initialized_home() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");
    cashback(&home)
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized cashback advisor"));
    home
}

#[test]
fn test_chat_requires_init() {
    let home = tempfile::tempdir().unwrap();
    cashback(&home)
        .args(["chat", "--user", "1"])
        .write_stdin("/help\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:").and(predicate::str::contains("cashback init")));
}

#[test]
fn test_save_and_find_best_offer() {
    let home = initialized_home();
    cashback(&home)
        .args(["chat", "--user", "1", "--name", "Alice"])
        .write_stdin("/creategroup Семья\nСбер, Такси, 5%, 3000\nтакси\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Group \"Семья\" created")
                .and(predicate::str::contains("Cashback saved"))
                .and(predicate::str::contains("Best cashback for \"такси\""))
                .and(predicate::str::contains("Alice")),
        );
}

#[test]
fn test_bank_typo_confirmed_over_stdin() {
    let home = initialized_home();
    cashback(&home)
        .args(["chat", "--user", "7"])
        .write_stdin("/creategroup Друзья\nТинькоф, Кино, 3, 1000\nда\n/banklist\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Possible typo")
                .and(predicate::str::contains("[ ✅ Да, исправить ]"))
                .and(predicate::str::contains("• Тинькофф")),
        );
}

#[test]
fn test_multiline_batch_and_list() {
    let home = initialized_home();
    cashback(&home)
        .args(["chat", "--user", "3", "--name", "Carol"])
        .write_stdin("/creategroup Работа\nСбер, Такси, 5, 1000\\\nВТБ, Аптеки, 3, 2000\n/list all\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 2 of 2").and(predicate::str::contains("showing 2 of 2")));
}

#[test]
fn test_cancel_drops_pending_prompt() {
    let home = initialized_home();
    cashback(&home)
        .args(["chat", "--user", "4"])
        .write_stdin("/creategroup Дом\n/joingroup\n/cancel\nКино\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Send the name of the group to join")
                .and(predicate::str::contains("Operation cancelled"))
                .and(predicate::str::contains("No active cashback found for \"Кино\"")),
        );
}

#[test]
fn test_groups_are_shared_between_sessions() {
    let home = initialized_home();
    cashback(&home)
        .args(["chat", "--user", "1", "--name", "Alice"])
        .write_stdin("/creategroup Семья\nАльфа, Аптеки, 7, 2000\n")
        .assert()
        .success();
    cashback(&home)
        .args(["chat", "--user", "2", "--name", "Bob"])
        .write_stdin("/joingroup Семья\nАптеки\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("joined").and(predicate::str::contains("Alice")));
}

#[test]
fn test_today_flag_controls_expiry() {
    let home = initialized_home();
    cashback(&home)
        .args(["chat", "--user", "5", "--today", "2025-01-15"])
        .write_stdin("/creategroup Дача\nСбер, Такси, 5, 1000, 31.01.2025\nтакси\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Best cashback for \"такси\""));

    cashback(&home)
        .args(["chat", "--user", "5", "--today", "2025-02-10"])
        .write_stdin("такси\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No active cashback found for \"такси\""));
}
