//! Integration tests for replug

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use serial_test::serial;
    use std::io::Write;

    fn replug() -> Command {
        cargo_bin_cmd!("replug")
    }

    /// A config pointing at a CLI binary that cannot exist, so commands
    /// fail deterministically before touching any control plane.
    fn missing_cli_config() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[control_plane]\ncli = \"replug-test-no-such-cli\"").unwrap();
        file
    }

    #[test]
    fn help_displays() {
        replug()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ordered volume detach/reattach"));
    }

    #[test]
    fn version_displays() {
        replug()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("replug"));
    }

    #[test]
    fn cycle_help_names_dry_run() {
        replug()
            .args(["cycle", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--dry-run"));
    }

    #[test]
    fn status_runs() {
        // Status may fail if the openstack client isn't installed, but
        // should not panic
        let _ = replug().arg("status").assert();
    }

    #[test]
    fn cycle_fails_without_cli() {
        let config = missing_cli_config();
        replug()
            .args(["--no-local", "-c"])
            .arg(config.path())
            .args(["cycle", "--yes"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Control-plane CLI not found"));
    }

    #[test]
    fn plan_fails_without_cli() {
        let config = missing_cli_config();
        replug()
            .args(["--no-local", "-c"])
            .arg(config.path())
            .arg("plan")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Control-plane CLI not found"));
    }

    #[test]
    fn cycle_rejects_bad_on_failure_value() {
        replug()
            .args(["cycle", "--on-failure", "retry"])
            .assert()
            .failure();
    }

    #[test]
    fn config_path() {
        replug()
            .args(["--no-local", "config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        replug()
            .args(["--no-local", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[control_plane]"));
    }

    #[test]
    fn config_show_reads_custom_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cycle]\nroot_device = \"/dev/sda\"").unwrap();

        replug()
            .args(["--no-local", "-c"])
            .arg(file.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("/dev/sda"));
    }

    #[test]
    #[serial]
    fn config_env_var_is_honored() {
        let config = missing_cli_config();
        replug()
            .env("REPLUG_CONFIG", config.path())
            .args(["--no-local", "plan"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Control-plane CLI not found"));
    }

    #[test]
    fn unknown_subcommand_fails() {
        replug().arg("frobnicate").assert().failure();
    }
}
