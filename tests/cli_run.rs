//! Behavioural tests for the `suiterun` binary.
#![cfg(unix)]

#[path = "common/job_dir.rs"]
mod job_dir;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

use job_dir::Project;

fn suiterun(project: &Project) -> Command {
    let mut cmd = cargo_bin_cmd!("suiterun");
    cmd.current_dir(project.root());
    for var in [
        "SUITERUN_JOBS_DIR",
        "SUITERUN_RECURSIVE",
        "SUITERUN_JOB_TIMEOUT_SECS",
        "SUITERUN_COLOR",
        "SUITERUN_STREAM_OUTPUT",
        "SUITERUN_NOTIFY_SEND",
        "SUITERUN_NOTIFY_COMMAND",
        "SUITERUN_NOTIFY_ALERT_COMMAND",
        "SUITERUN_VERBOSE",
        "SUITERUN_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn failing_job_in_the_middle_is_reported_and_later_jobs_still_run() {
    let project = Project::new();
    project.add_logging_job("a.sh", 0);
    project.add_logging_job("b.sh", 1);
    project.add_logging_job("c.sh", 0);

    suiterun(&project).assert().code(1).stdout(concat!(
        "RUNNING tests/a.sh\n",
        "PASSED tests/a.sh\n",
        "RUNNING tests/b.sh\n",
        "FAILED tests/b.sh (exit status 1)\n",
        "RUNNING tests/c.sh\n",
        "PASSED tests/c.sh\n",
        "ERROR: 1 OUT OF 3 TEST(S) FAILED.\n",
    ));

    assert_eq!(project.ran(), ["a.sh", "b.sh", "c.sh"]);
}

#[test]
fn all_passing_jobs_exit_zero() {
    let project = Project::new();
    project.add_job("one.sh", 0);
    project.add_job("two.sh", 0);

    suiterun(&project)
        .assert()
        .success()
        .stdout(contains("SUCCESS: 2 TEST(S) PASSED.\n"));
}

#[test]
fn empty_job_directory_is_a_success() {
    let project = Project::new();

    suiterun(&project)
        .assert()
        .success()
        .stdout("SUCCESS: 0 TEST(S) PASSED.\n");
}

#[test]
fn missing_job_directory_fails_before_running_anything() {
    let project = Project::without_jobs_dir();

    suiterun(&project)
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("job discovery failed: job directory missing: tests"));
}

#[test]
fn job_output_is_streamed_through() {
    let project = Project::new();
    project.add_script("talk.sh", "#!/bin/sh\necho hello from the job\nexit 0\n");

    suiterun(&project)
        .assert()
        .success()
        .stdout(contains("hello from the job"));
}

#[test]
fn quiet_flag_hides_running_lines() {
    let project = Project::new();
    project.add_job("a.sh", 0);
    project.add_job("b.sh", 3);

    suiterun(&project).arg("--quiet").assert().code(1).stdout(concat!(
        "PASSED tests/a.sh\n",
        "FAILED tests/b.sh (exit status 3)\n",
        "ERROR: 1 OUT OF 2 TEST(S) FAILED.\n",
    ));
}

#[test]
fn quiet_can_come_from_the_environment() {
    let project = Project::new();
    project.add_job("a.sh", 0);

    suiterun(&project)
        .env("SUITERUN_VERBOSE", "false")
        .assert()
        .success()
        .stdout("PASSED tests/a.sh\nSUCCESS: 1 TEST(S) PASSED.\n");
}

#[test]
fn list_flag_prints_jobs_without_running_them() {
    let project = Project::new();
    project.add_logging_job("b.sh", 1);
    project.add_logging_job("a.sh", 0);

    suiterun(&project)
        .arg("--list")
        .assert()
        .success()
        .stdout("tests/a.sh\ntests/b.sh\n");

    assert!(project.ran().is_empty(), "--list must not execute jobs");
}

#[test]
fn jobs_dir_can_come_from_the_environment() {
    let project = Project::new();
    project.add_script("../ci/only.sh", "#!/bin/sh\nexit 0\n");

    suiterun(&project)
        .env("SUITERUN_JOBS_DIR", "ci")
        .assert()
        .success()
        .stdout(contains("PASSED ci/only.sh"));
}

#[test]
fn recursive_flag_finds_nested_jobs() {
    let project = Project::new();
    project.add_job("top.sh", 0);
    project.add_job("nested/inner.sh", 2);

    suiterun(&project)
        .arg("--recursive")
        .assert()
        .code(1)
        .stdout(contains("FAILED tests/nested/inner.sh (exit status 2)"))
        .stdout(contains("ERROR: 1 OUT OF 2 TEST(S) FAILED."));
}

#[test]
fn timeout_flag_fails_hanging_jobs() {
    let project = Project::new();
    project.add_script("hang.sh", "#!/bin/sh\nsleep 30\nexit 0\n");
    project.add_job("z-after.sh", 0);

    suiterun(&project)
        .timeout(std::time::Duration::from_secs(20))
        .args(["--timeout", "1"])
        .assert()
        .code(1)
        .stdout(contains("FAILED tests/hang.sh (timed out after 1s)"))
        .stdout(contains("PASSED tests/z-after.sh"));
}

#[test]
fn invalid_colour_configuration_is_reported() {
    let project = Project::new();

    suiterun(&project)
        .env("SUITERUN_COLOR", "rainbow")
        .assert()
        .code(1)
        .stderr(contains("SUITERUN_COLOR"));
}
