// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::Result;
use fs_err as fs;
use indoc::{formatdoc, indoc};
use orbtest_runner::{
    errors::SetupError,
    runner::{NoVerdictReason, TestOutcome},
};
use pretty_assertions::assert_eq;
use std::{
    env::consts::EXE_SUFFIX,
    time::{Duration, Instant},
};

fn install_pair(fixture: &SuiteFixture) -> Result<()> {
    fixture.install_server("server")?;
    fixture.install_client("client")?;
    Ok(())
}

#[test]
fn ior_is_forwarded_to_client() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;
    fixture.write_conf(
        "server.conf",
        indoc! {"
            line = Initializing ORB
            line = 'IOR:deadbeef123'
            line = serving requests
        "},
    )?;
    fixture.write_conf("client.conf", "expect-ior = IOR:deadbeef123\n")?;

    let outcome = fixture.runner(10).run_client_server(
        "client",
        Some("client.conf"),
        "server",
        Some("server.conf"),
    )?;
    assert!(outcome.is_success(), "outcome: {outcome:?}");

    let client_output = fixture.read_output("client")?;
    assert!(
        client_output.contains("args = IOR:deadbeef123\n"),
        "{client_output}"
    );

    // Output printed after the IOR is still captured.
    let server_output = fixture.read_output("server")?;
    assert!(
        server_output.contains("'IOR:deadbeef123'"),
        "{server_output}"
    );
    assert!(server_output.contains("serving requests"), "{server_output}");
    Ok(())
}

#[test]
fn ior_split_across_reads() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;
    fixture.write_conf("server.conf", "split-line = server ready: 'IOR:cafe01'\n")?;
    fixture.write_conf("client.conf", "expect-ior = IOR:cafe01\n")?;

    let outcome = fixture.runner(10).run_client_server(
        "client",
        Some("client.conf"),
        "server",
        Some("server.conf"),
    )?;
    assert!(outcome.is_success(), "outcome: {outcome:?}");
    Ok(())
}

#[test]
fn default_server_ior() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;

    let outcome = fixture
        .runner(10)
        .run_client_server("client", None, "server", None)?;
    assert!(outcome.is_success(), "outcome: {outcome:?}");
    Ok(())
}

#[test]
fn client_failure_is_reported() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;
    fixture.write_conf("client.conf", "verdict = failed\n")?;

    let outcome =
        fixture
            .runner(10)
            .run_client_server("client", Some("client.conf"), "server", None)?;
    assert!(matches!(outcome, TestOutcome::Failed), "outcome: {outcome:?}");
    Ok(())
}

#[test]
fn each_child_gets_its_own_conf() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;
    let server_conf = fixture.write_conf("server.conf", "line = IOR:abc123\n")?;
    let client_conf = fixture.write_test_conf("client.conf", "verdict = passed\n")?;

    let outcome = fixture.runner(10).run_client_server(
        "client",
        Some("client.conf"),
        "server",
        Some("server.conf"),
    )?;
    assert!(outcome.is_success(), "outcome: {outcome:?}");

    let server_output = fixture.read_output("server")?;
    let client_output = fixture.read_output("client")?;
    assert!(server_output.contains(&format!("conf = {server_conf}\n")));
    assert!(client_output.contains(&format!("conf = {client_conf}\n")));
    Ok(())
}

#[test]
fn malformed_ior_skips_client() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;
    fixture.write_conf("server.conf", "line = IOR:DEADBEEF\n")?;

    let outcome =
        fixture
            .runner(10)
            .run_client_server("client", None, "server", Some("server.conf"))?;
    match outcome {
        TestOutcome::NoVerdict(NoVerdictReason::MalformedIor(error)) => {
            assert_eq!(error.line(), "IOR:DEADBEEF\n");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!fixture.output_file("client").exists());
    Ok(())
}

#[test]
fn server_dies_before_ior() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;
    fixture.write_conf(
        "server.conf",
        indoc! {"
            line = fatal: cannot bind
            exit = 3
        "},
    )?;

    let outcome =
        fixture
            .runner(10)
            .run_client_server("client", None, "server", Some("server.conf"))?;
    match outcome {
        TestOutcome::NoVerdict(NoVerdictReason::ServerDied { status }) => {
            if let Some(status) = status {
                assert_eq!(status.code(), Some(3));
            }
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!fixture.output_file("client").exists());
    assert!(fixture.read_output("server")?.contains("cannot bind"));
    Ok(())
}

#[test]
fn server_without_ior_times_out() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;
    fixture.write_conf("server.conf", "delay-ms = 30000\n")?;

    let start = Instant::now();
    let outcome =
        fixture
            .runner(1)
            .run_client_server("client", None, "server", Some("server.conf"))?;
    assert!(
        start.elapsed() < Duration::from_secs(20),
        "took {:?}",
        start.elapsed()
    );
    assert!(
        matches!(
            outcome,
            TestOutcome::NoVerdict(NoVerdictReason::ServerTimedOut { .. })
        ),
        "outcome: {outcome:?}"
    );
    assert!(!fixture.output_file("client").exists());
    Ok(())
}

#[test]
fn missing_executables_fail_before_spawning() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    fixture.install_client("client")?;

    let error = fixture
        .runner(10)
        .run_client_server("client", None, "server", None)
        .unwrap_err();
    assert!(
        matches!(error, SetupError::ExecutableNotFound(_)),
        "error: {error}"
    );
    assert!(!fixture.output_dir().exists());
    Ok(())
}

#[test]
fn missing_conf_fails_before_spawning() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;

    let error = fixture
        .runner(10)
        .run_client_server("client", Some("missing.conf"), "server", None)
        .unwrap_err();
    assert!(
        matches!(error, SetupError::ConfigNotFound(_)),
        "error: {error}"
    );
    assert!(!fixture.output_file("server").exists());
    Ok(())
}

#[test]
fn generated_config_renames_conf_variable() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;
    fixture.write_suite_config("conf-env-var = \"OTHER_ORB_CONF\"\n")?;
    fixture.write_conf("client.conf", "verdict = failed\n")?;

    // The client never sees its configuration, so it uses its default verdict.
    let outcome =
        fixture
            .runner(10)
            .run_client_server("client", Some("client.conf"), "server", None)?;
    assert!(outcome.is_success(), "outcome: {outcome:?}");
    assert!(fixture.read_output("client")?.contains("conf = none"));
    Ok(())
}

#[test]
fn coverage_wraps_both_executables() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;
    fixture.write_suite_config(&formatdoc! {r#"
        [coverage]
        tool = "{}"
        target = "x86-linux"
    "#, FAKE_XCOV.escape_default()})?;

    let outcome = fixture
        .coverage_runner(10)
        .run_client_server("client", None, "server", None)?;
    assert!(outcome.is_success(), "outcome: {outcome:?}");

    // Traces are written next to the executables while they run.
    let client = format!("client{EXE_SUFFIX}");
    let server = format!("server{EXE_SUFFIX}");
    let client_trace =
        fs::read_to_string(fixture.testsuite_dir().join(format!("{client}.trace")))?;
    assert!(client_trace.contains("target = x86-linux"), "{client_trace}");
    assert!(client_trace.contains("args = IOR:"), "{client_trace}");
    assert!(
        fixture
            .testsuite_dir()
            .join(format!("{server}.trace"))
            .exists()
    );

    // The reports are captured in the log directory.
    let report = fixture.read_output(&format!("{client}.trace"))?;
    assert!(
        report.contains("coverage = branch, annotate = report"),
        "{report}"
    );
    assert!(fixture.output_file(&format!("{server}.trace")).exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn server_is_terminated() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    install_pair(&fixture)?;

    let outcome = fixture
        .runner(10)
        .run_client_server("client", None, "server", None)?;
    assert!(outcome.is_success(), "outcome: {outcome:?}");

    let pid = server_pid(&fixture.read_output("server")?).expect("server printed its pid");
    // The server was reaped, so signalling it fails.
    let res = unsafe { libc::kill(pid as libc::pid_t, 0) };
    assert_eq!(res, -1, "server {pid} is still running");
    Ok(())
}
