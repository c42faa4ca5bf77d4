use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::fs;

fn benchrun_cmd(build_dir: &std::path::Path, output_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("benchrun").unwrap();
    cmd.arg("--build-dir").arg(build_dir);
    cmd.arg("--output-dir").arg(output_dir);
    cmd.env("NO_COLOR", "1");
    cmd
}

// ---- Discovery failure (cross-platform) ----

#[test]
fn empty_build_dir_exits_nonzero_and_writes_nothing() {
    let build = TempDir::new().unwrap();
    let out = build.path().join("results");

    benchrun_cmd(build.path(), &out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No benchmarks found"));

    // Nothing was created — the invocation died before any output.
    assert!(!out.exists());
}

#[test]
fn non_benchmark_files_are_not_discovered() {
    let build = TempDir::new().unwrap();
    fs::write(build.path().join("random_tool"), "").unwrap();
    fs::write(build.path().join("notes.txt"), "").unwrap();
    let out = build.path().join("results");

    benchrun_cmd(build.path(), &out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No benchmarks found"));
}

#[test]
fn invalid_filter_pattern_is_fatal() {
    let build = TempDir::new().unwrap();
    fs::write(build.path().join("alpha_benchmark"), "").unwrap();
    let out = build.path().join("results");

    benchrun_cmd(build.path(), &out)
        .args(["--benchmarks", "(["])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid benchmark filter pattern"));
}

// ---- Full pipeline (unix: fake benchmarks are shell scripts) ----

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const ALPHA_JSON: &str = r#"{"benchmarks": [{"name": "Insert/64", "real_time": 12.5, "cpu_time": 12.0, "time_unit": "ns", "iterations": 1000}]}"#;

    /// Helper: install an executable `#!/bin/sh` script named `name` into `dir`.
    fn install_script(dir: &std::path::Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn install_alpha(dir: &std::path::Path) {
        install_script(dir, "alpha_benchmark", &format!("cat <<'EOF'\n{}\nEOF", ALPHA_JSON));
    }

    fn install_beta_failing(dir: &std::path::Path) {
        install_script(dir, "beta_benchmark", "echo segfault >&2\nexit 1");
    }

    #[test]
    fn mixed_success_and_failure_batch() {
        let build = TempDir::new().unwrap();
        install_alpha(build.path());
        install_beta_failing(build.path());
        let out = build.path().join("results");

        // One failing benchmark never fails the batch.
        benchrun_cmd(build.path(), &out)
            .assert()
            .success()
            .stdout(predicate::str::contains("Found 2 benchmark(s):"))
            .stdout(predicate::str::contains("✓ alpha_benchmark"))
            .stdout(predicate::str::contains("✗ beta_benchmark"));

        // Snapshot holds both outcomes in execution order.
        let raw = fs::read_to_string(out.join("benchmark_results.json")).unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let results = snapshot["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["name"], "alpha_benchmark");
        assert_eq!(results[0]["success"], true);
        assert_eq!(results[1]["name"], "beta_benchmark");
        assert_eq!(results[1]["success"], false);
        assert_eq!(results[1]["error"], "segfault\n");

        // Narrative report: counts, the single dataset row, and the
        // failure appendix quoting stderr.
        let md = fs::read_to_string(out.join("benchmark_report.md")).unwrap();
        assert!(md.contains("- **Successful**: 1"));
        assert!(md.contains("- **Failed**: 1"));
        assert!(md.contains("### alpha"));
        assert!(md.contains("| Insert/64 | 12.50 | ns | 1000 |"));
        assert!(md.contains("segfault"));

        // One chart, named after the suite.
        assert!(out.join("alpha_chart.svg").is_file());
    }

    #[test]
    fn unstructured_stdout_is_kept_in_snapshot_only() {
        let build = TempDir::new().unwrap();
        install_script(
            build.path(),
            "plain_benchmark",
            "echo 'running 5 iterations'\necho 'done'",
        );
        let out = build.path().join("results");

        benchrun_cmd(build.path(), &out)
            .assert()
            .success()
            .stderr(predicate::str::contains("No benchmark data to plot"));

        // Run recorded as a success with its text captured verbatim...
        let raw = fs::read_to_string(out.join("benchmark_results.json")).unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot["results"][0]["success"], true);
        assert!(
            snapshot["results"][0]["stdout"]
                .as_str()
                .unwrap()
                .contains("running 5 iterations")
        );

        // ...but it contributed zero rows, so no report artifacts exist.
        assert!(!out.join("benchmark_report.md").exists());
        assert!(!out.join("plain_chart.svg").exists());
    }

    #[test]
    fn json_only_skips_report_artifacts() {
        let build = TempDir::new().unwrap();
        install_alpha(build.path());
        let out = build.path().join("results");

        benchrun_cmd(build.path(), &out)
            .arg("--json-only")
            .assert()
            .success();

        assert!(out.join("benchmark_results.json").is_file());
        assert!(!out.join("benchmark_report.md").exists());
        assert!(!out.join("alpha_chart.svg").exists());
    }

    #[test]
    fn filter_pattern_limits_the_batch() {
        let build = TempDir::new().unwrap();
        install_alpha(build.path());
        install_beta_failing(build.path());
        let out = build.path().join("results");

        benchrun_cmd(build.path(), &out)
            .args(["--benchmarks", "^alpha"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Found 1 benchmark(s):"))
            .stdout(predicate::str::contains("alpha_benchmark"))
            .stdout(predicate::str::contains("beta_benchmark").not());

        let raw = fs::read_to_string(out.join("benchmark_results.json")).unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot["results"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn benchmarks_found_in_bin_subdirectory() {
        let build = TempDir::new().unwrap();
        let bin = build.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        install_alpha(&bin);
        let out = build.path().join("results");

        benchrun_cmd(build.path(), &out)
            .assert()
            .success()
            .stdout(predicate::str::contains("Found 1 benchmark(s):"));
    }

    #[test]
    fn snapshot_records_machine_info() {
        let build = TempDir::new().unwrap();
        install_alpha(build.path());
        let out = build.path().join("results");

        benchrun_cmd(build.path(), &out).assert().success();

        let raw = fs::read_to_string(out.join("benchmark_results.json")).unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let info = &snapshot["machine_info"];
        assert!(info["timestamp"].is_string());
        assert!(info["platform"].is_string());
        assert!(info["architecture"].is_string());
        assert!(info["harness_version"].is_string());
    }

    #[test]
    fn launch_failure_is_recorded_not_fatal() {
        let build = TempDir::new().unwrap();
        // Present but not executable — spawn fails.
        fs::write(build.path().join("broken_benchmark"), "not a program").unwrap();
        install_alpha(build.path());
        let out = build.path().join("results");

        benchrun_cmd(build.path(), &out).assert().success();

        let raw = fs::read_to_string(out.join("benchmark_results.json")).unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let results = snapshot["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        let broken = results
            .iter()
            .find(|r| r["name"] == "broken_benchmark")
            .unwrap();
        assert_eq!(broken["success"], false);
        assert!(broken["error"].is_string());
    }
}
