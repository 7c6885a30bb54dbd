//! Integration tests for the pan CLI
//!
//! These run the real binary against an isolated config directory. Nothing
//! here needs a reachable drive service: commands that go to the network are
//! pointed at a closed local port.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run pan with the given config directory and the personal drive
fn run_pan(args: &[&str], config_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pan"))
        .args(args)
        .env("PAN_CONFIG_DIR", config_dir)
        .env_remove("PAN_FAMILY_ID")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute pan command")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// Point both service endpoints at a port nothing listens on
fn unreachable_service(config_dir: &Path) {
    for (key, value) in [
        ("web_url", "http://127.0.0.1:1"),
        ("api_url", "http://127.0.0.1:1"),
        ("transport.connect_timeout_ms", "500"),
        ("transport.request_timeout_ms", "1000"),
    ] {
        let output = run_pan(&["config", "set", key, value], config_dir);
        assert!(output.status.success(), "config set {key} failed");
    }
}

mod config {
    use super::*;

    #[test]
    fn test_set_then_show() {
        let dir = TempDir::new().unwrap();

        let output = run_pan(
            &["config", "set", "max_download_parallel", "16", "--json"],
            dir.path(),
        );
        assert!(output.status.success());
        let json = stdout_json(&output);
        assert_eq!(json["key"], "max_download_parallel");
        assert!(dir.path().join("config.toml").exists());

        let output = run_pan(&["config", "show", "--json"], dir.path());
        assert!(output.status.success());
        let entries = stdout_json(&output);
        let entry = entries
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["key"] == "max_download_parallel")
            .unwrap();
        assert_eq!(entry["value"], "16");
    }

    #[test]
    fn test_out_of_range_value_is_usage_error() {
        let dir = TempDir::new().unwrap();
        let output = run_pan(&["config", "set", "max_download_load", "9"], dir.path());
        assert_eq!(output.status.code(), Some(2));
        assert!(!dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_unknown_key_is_usage_error() {
        let dir = TempDir::new().unwrap();
        let output = run_pan(&["config", "set", "no_such_key", "1"], dir.path());
        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("no_such_key"));
    }

    #[test]
    fn test_show_human_table() {
        let dir = TempDir::new().unwrap();
        let output = run_pan(&["config", "show", "--no-color"], dir.path());
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("KEY"));
        assert!(stdout.contains("cache_size"));
    }
}

mod workdir {
    use super::*;

    #[test]
    fn test_pwd_defaults_to_root() {
        let dir = TempDir::new().unwrap();
        let output = run_pan(&["pwd"], dir.path());
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "/");
    }

    #[test]
    fn test_json_output_default_from_config() {
        let dir = TempDir::new().unwrap();
        let output = run_pan(&["config", "set", "defaults.output", "json"], dir.path());
        assert!(output.status.success());

        let output = run_pan(&["pwd"], dir.path());
        assert!(output.status.success());
        let json = stdout_json(&output);
        assert_eq!(json["workdir"], "/");
    }

    #[test]
    fn test_pwd_family_json() {
        let dir = TempDir::new().unwrap();
        let output = run_pan(&["pwd", "--family", "42", "--json"], dir.path());
        assert!(output.status.success());
        let json = stdout_json(&output);
        assert_eq!(json["scope"]["family"], 42);
        assert_eq!(json["workdir"], "/");
    }
}

mod batch {
    use super::*;

    #[test]
    fn test_rm_unreachable_service_reports_failed_paths() {
        let dir = TempDir::new().unwrap();
        unreachable_service(dir.path());

        let output = run_pan(&["rm", "/a.txt", "/b.txt", "--json"], dir.path());
        assert_eq!(output.status.code(), Some(1));

        let json = stdout_json(&output);
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "delete");
        assert_eq!(json["state"], "nothing_to_do");
        assert!(json.get("task_id").is_none());
        let failed = json["failed_to_resolve"].as_array().unwrap();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0]["path"], "/a.txt");
        assert_eq!(failed[1]["path"], "/b.txt");
        assert!(json["succeeded"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_rm_root_never_reaches_the_service() {
        let dir = TempDir::new().unwrap();
        unreachable_service(dir.path());

        let output = run_pan(&["rm", "/", "--json"], dir.path());
        assert_eq!(output.status.code(), Some(1));
        let json = stdout_json(&output);
        let failed = json["failed_to_resolve"].as_array().unwrap();
        assert_eq!(failed.len(), 1);
        assert!(
            failed[0]["reason"]
                .as_str()
                .unwrap()
                .contains("root folder")
        );
    }

    #[test]
    fn test_mv_unreachable_target_is_network_error() {
        let dir = TempDir::new().unwrap();
        unreachable_service(dir.path());

        let output = run_pan(&["mv", "/a.txt", "/dest"], dir.path());
        assert_eq!(output.status.code(), Some(3));
    }
}

mod usage {
    use super::*;

    #[test]
    fn test_missing_arguments() {
        let dir = TempDir::new().unwrap();
        let output = run_pan(&["rm"], dir.path());
        assert_eq!(output.status.code(), Some(2));

        let output = run_pan(&["cp", "/only-one"], dir.path());
        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_completions() {
        let dir = TempDir::new().unwrap();
        let output = run_pan(&["completions", "bash"], dir.path());
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("pan"));
    }

    #[test]
    fn test_newer_config_schema_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "schema_version = 99\n").unwrap();
        let output = run_pan(&["pwd"], dir.path());
        assert_eq!(output.status.code(), Some(2));
    }
}
