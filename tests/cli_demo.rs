//! CLI integration tests for the demo and bench modes.

use std::process::Command;

fn line_value<'a>(stdout: &'a str, key: &str) -> &'a str {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix(key))
        .unwrap_or_else(|| panic!("{key} line missing"))
}

#[test]
fn demo_cli_returns_every_order_without_tint_violation() {
    let bin = env!("CARGO_BIN_EXE_paintshop");
    let output = Command::new(bin)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run demo binary");

    assert!(
        output.status.success(),
        "demo exited with non-zero status: {:?}",
        output.status
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DEMO SUMMARY"), "demo summary missing from output");
    assert_eq!(line_value(&stdout, "tint_violation="), "false");
    assert_eq!(line_value(&stdout, "mismatched_returns="), "0");
    // Go-home orders close the shop at the end of the demo.
    assert_eq!(line_value(&stdout, "shop_closed="), "true");
}

#[test]
fn bench_cli_prints_one_csv_row() {
    let bin = env!("CARGO_BIN_EXE_paintshop");
    let output = Command::new(bin)
        .args(["bench", "3", "5", "2", "4", "0", "validate"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run bench binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert!(lines.next().expect("csv header").starts_with("customers,"));
    let row: Vec<&str> = lines.next().expect("csv row").split(',').collect();
    assert_eq!(&row[..5], &["3", "5", "2", "4", "15"]);
    assert_eq!(row[11], "false");
    assert_eq!(row[12], "0");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("# violation"));
}

#[test]
fn unknown_command_exits_with_usage() {
    let bin = env!("CARGO_BIN_EXE_paintshop");
    let output = Command::new(bin)
        .arg("paint-it-black")
        .output()
        .expect("failed to run binary");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown command"));
}
