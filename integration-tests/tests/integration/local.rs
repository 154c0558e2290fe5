// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::Result;
use indoc::indoc;
use orbtest_runner::{errors::SetupError, runner::TestOutcome, verdict::Verdict};
use std::time::{Duration, Instant};
use test_case::test_case;

#[test_case("verdict = passed\n", Verdict::Passed; "passing test")]
#[test_case("verdict = failed\n", Verdict::Failed; "failing test")]
#[test_case("verdict = none\n", Verdict::Failed; "missing marker")]
fn local_verdict(conf: &str, expected: Verdict) -> Result<()> {
    let fixture = SuiteFixture::new()?;
    fixture.install_client("test000")?;
    fixture.write_conf("local.conf", conf)?;

    let outcome = fixture.runner(10).run_local("test000", Some("local.conf"), &[])?;
    assert_eq!(outcome.verdict(), Some(expected));
    Ok(())
}

#[test]
fn local_captures_combined_output() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    fixture.install_client("test000")?;
    let conf = fixture.write_test_conf("test000.conf", "verdict = passed\n")?;

    let args = ["-v".to_owned(), "two words".to_owned()];
    let outcome = fixture
        .runner(10)
        .run_local("test000", Some("test000.conf"), &args)?;
    assert!(outcome.is_success(), "outcome: {outcome:?}");

    let output = fixture.read_output("local")?;
    assert!(output.contains(&format!("conf = {conf}")), "{output}");
    assert!(output.contains("args = -v 'two words'"), "{output}");
    assert!(output.contains("client stderr"), "{output}");
    assert!(output.contains("END TESTS"), "{output}");
    Ok(())
}

#[test]
fn local_without_conf_sets_no_variable() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    fixture.install_client("test000")?;

    let outcome = fixture.runner(10).run_local("test000", None, &[])?;
    assert!(outcome.is_success(), "outcome: {outcome:?}");
    assert!(fixture.read_output("local")?.contains("conf = none"));
    Ok(())
}

#[test]
fn local_absolute_conf_path() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    fixture.install_client("test000")?;
    let conf = fixture.write_conf("abs.conf", "verdict = failed\n")?;

    let outcome = fixture
        .runner(10)
        .run_local("test000", Some(conf.as_str()), &[])?;
    assert!(matches!(outcome, TestOutcome::Failed), "outcome: {outcome:?}");
    Ok(())
}

#[test]
fn local_missing_executable() -> Result<()> {
    let fixture = SuiteFixture::new()?;

    let error = fixture
        .runner(10)
        .run_local("no_such_test", None, &[])
        .unwrap_err();
    match error {
        SetupError::ExecutableNotFound(error) => {
            assert!(error.path().as_str().contains("no_such_test"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!fixture.output_file("local").exists());
    Ok(())
}

#[test]
fn local_missing_conf() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    fixture.install_client("test000")?;

    let error = fixture
        .runner(10)
        .run_local("test000", Some("missing.conf"), &[])
        .unwrap_err();
    match error {
        SetupError::ConfigNotFound(error) => {
            assert_eq!(error.name(), "missing.conf");
            assert_eq!(error.searched().len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn local_resource_limit_kills_child() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    fixture.install_client("test000")?;
    fixture.write_conf(
        "slow.conf",
        indoc! {"
            sleep-ms = 30000
            verdict = passed
        "},
    )?;

    let start = Instant::now();
    let outcome = fixture.runner(1).run_local("test000", Some("slow.conf"), &[])?;
    assert!(
        start.elapsed() < Duration::from_secs(20),
        "took {:?}",
        start.elapsed()
    );
    // The child printed its preamble but was killed before the verdict.
    assert!(matches!(outcome, TestOutcome::Failed), "outcome: {outcome:?}");
    Ok(())
}

#[test]
fn local_output_dir_is_reused() -> Result<()> {
    let fixture = SuiteFixture::new()?;
    fixture.install_client("test000")?;
    let runner = fixture.runner(10);

    assert!(runner.run_local("test000", None, &[])?.is_success());
    assert!(runner.run_local("test000", None, &[])?.is_success());
    Ok(())
}
