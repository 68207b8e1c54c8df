//! Concurrency tests for the sweat CLI.
//!
//! These tests verify that multiple processes against one data dir:
//! - Never start more than one active session
//! - Keep the ledger consistent under concurrent completions

use assert_cmd::Command;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli() -> Command {
    Command::cargo_bin("sweat").expect("Failed to find sweat binary")
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_racing_starts_produce_one_active_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                let output = cli()
                    .args(["start", &format!("racer {}", i)])
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .timeout(Duration::from_secs(10))
                    .output()
                    .expect("Failed to run start");
                output.status.success()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1, "exactly one racing start may win");

    // The data file holds exactly one active session
    let contents =
        std::fs::read_to_string(data_dir.join("sweat.json")).expect("Failed to read data file");
    let data: serde_json::Value = serde_json::from_str(&contents).expect("Data file not JSON");
    let active = data["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["status"] == "active")
        .count();
    assert_eq!(active, 1);
}

#[test]
fn test_concurrent_completions_keep_ledger_consistent() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .args(["start", "Grind"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    // First seeded action is worth 5 points
    let output = cli()
        .arg("catalog")
        .arg("--data-dir")
        .arg(&data_dir)
        .output()
        .expect("Failed to run catalog");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let action_id = stdout
        .lines()
        .skip_while(|l| !l.starts_with("Actions:"))
        .nth(1)
        .and_then(|l| l.split_whitespace().next())
        .expect("no action id in catalog output")
        .to_string();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let data_dir = data_dir.clone();
            let action_id = action_id.clone();
            thread::spawn(move || {
                // Small stagger to reduce thundering herd
                thread::sleep(Duration::from_millis(i * 5));
                cli()
                    .args(["complete", &action_id])
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .timeout(Duration::from_secs(10))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // Stored totals match the completion history
    let contents =
        std::fs::read_to_string(data_dir.join("sweat.json")).expect("Failed to read data file");
    let data: serde_json::Value = serde_json::from_str(&contents).expect("Data file not JSON");

    let session = &data["sessions"].as_array().unwrap()[0];
    assert_eq!(session["points_earned"], 25);

    let completions = data["action_completions"].as_array().unwrap();
    assert_eq!(completions.len(), 5);
    let summed: u64 = completions
        .iter()
        .map(|c| c["points_awarded"].as_u64().unwrap())
        .sum();
    assert_eq!(summed, 25);
}
