//! Integration tests for the pkhost CLI

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Write a config that keeps the cache inside `dir` and steps quickly
fn write_config(dir: &Path, poll_interval_ms: u64) -> std::path::PathBuf {
    let config = dir.join("config.toml");
    let cache = dir.join("package-cache.txt");
    std::fs::write(
        &config,
        format!(
            "[worker]\npoll_interval_ms = {poll_interval_ms}\n\n[cache]\nenabled = true\npath = \"{}\"\n",
            cache.display()
        ),
    )
    .unwrap();
    config
}

fn pkhost(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pkhost"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("PK_OUTPUT")
        .env_remove("PK_POLL_INTERVAL_MS")
        .env_remove("PK_CACHE_PATH")
        .env_remove("PK_CACHE_ENABLED")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute pkhost")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_pkhost"))
        .arg("--version")
        .output()
        .expect("Failed to execute pkhost");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pkhost"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_pkhost"))
        .arg("--help")
        .output()
        .expect("Failed to execute pkhost");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("search-name"));
    assert!(stdout.contains("search-group"));
    assert!(stdout.contains("cache"));
}

#[test]
fn test_roles_json() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 5);
    let output = pkhost(&config, &["--json", "roles"]);

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["description"], "Test Thread");
    assert_eq!(json["cancel"], true);
    assert_eq!(
        json["roles"],
        serde_json::json!(["search-group", "search-name"])
    );
}

#[test]
fn test_search_name_fills_cache() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 5);

    let output = pkhost(&config, &["--json", "search-name", "glib", "--filter", "installed"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["exit"], "success");
    assert_eq!(json["packages"].as_array().unwrap().len(), 2);
    assert_eq!(
        json["packages"][0]["package_id"],
        "glib2;2.14.0;i386;fedora"
    );

    let cached = std::fs::read_to_string(dir.path().join("package-cache.txt")).unwrap();
    assert_eq!(
        cached,
        "installed\tglib2;2.14.0;i386;fedora\tThe GLib library\n\
         installed\tgtk2;gtk2-2.11.6-6.fc8;i386;fedora\tGTK+ Libraries for GIMP"
    );

    let output = pkhost(&config, &["--json", "cache", "show"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["packages"].as_array().unwrap().len(), 2);

    let output = pkhost(&config, &["cache", "clear"]);
    assert!(output.status.success());
    assert!(!dir.path().join("package-cache.txt").exists());
}

#[test]
fn test_search_name_cancel_after() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 200);

    let output = pkhost(
        &config,
        &["--json", "search-name", "glib", "--cancel-after", "50"],
    );
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["exit"], "cancelled");
    assert_eq!(json["errors"][0]["kind"], "transaction-cancelled");
    assert!(json["packages"].as_array().unwrap().is_empty());
    assert!(!dir.path().join("package-cache.txt").exists());
}

#[test]
fn test_search_group_plain_output() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 5);

    let output = pkhost(&config, &["search-group", "system"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("glib2;2.14.0;i386;fedora"));
    assert!(stdout.contains("GTK+ Libraries for GIMP"));
}

#[test]
fn test_invalid_filter_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 5);

    let output = pkhost(&config, &["search-name", "glib", "--filter", "shiny"]);
    assert!(!output.status.success());
}

#[test]
fn test_empty_search_term_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 5);

    let output = pkhost(&config, &["search-name", ""]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("search term"));
}
