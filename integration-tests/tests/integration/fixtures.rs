// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use color_eyre::{Result, eyre::Context};
use fs_err as fs;
use integration_tests::orbtest_cli::OrbtestCli;
use orbtest_runner::{
    config::SuiteConfig,
    runner::TestRunner,
    settings::{SuiteSettings, SuiteSettingsBuilder},
};
use std::{env::consts::EXE_SUFFIX, time::Duration};

pub const FAKE_SERVER: &str = env!("CARGO_BIN_EXE_fake-orb-server");
pub const FAKE_CLIENT: &str = env!("CARGO_BIN_EXE_fake-orb-client");
pub const FAKE_XCOV: &str = env!("CARGO_BIN_EXE_fake-xcov");
pub const ORBTEST_DUP: &str = env!("CARGO_BIN_EXE_orbtest-dup");

pub const TEST_NAME: &str = "all_types";

/// A temporary testsuite layout.
#[derive(Debug)]
pub struct SuiteFixture {
    _temp_dir: Utf8TempDir,
    src_dir: Utf8PathBuf,
    build_dir: Utf8PathBuf,
    log_dir: Utf8PathBuf,
}

impl SuiteFixture {
    pub fn new() -> Result<Self> {
        let temp_dir = camino_tempfile::Builder::new()
            .prefix("orbtest-fixture-")
            .tempdir()?;
        let src_dir = temp_dir.path().join("src");
        let build_dir = temp_dir.path().join("build");
        let log_dir = temp_dir.path().join("log");

        fs::create_dir_all(src_dir.join("tests/confs"))?;
        fs::create_dir_all(src_dir.join(TEST_NAME))?;
        fs::create_dir_all(build_dir.join("testsuite"))?;
        fs::create_dir_all(&log_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            src_dir,
            build_dir,
            log_dir,
        })
    }

    pub fn testsuite_dir(&self) -> Utf8PathBuf {
        self.build_dir.join("testsuite")
    }

    pub fn output_dir(&self) -> Utf8PathBuf {
        self.log_dir.join(TEST_NAME)
    }

    pub fn output_file(&self, suffix: &str) -> Utf8PathBuf {
        self.output_dir().join(format!("{TEST_NAME}.{suffix}"))
    }

    pub fn read_output(&self, suffix: &str) -> Result<String> {
        Ok(fs::read_to_string(self.output_file(suffix))?)
    }

    /// Installs the fake server as `testsuite/<name>`.
    pub fn install_server(&self, name: &str) -> Result<()> {
        self.install(FAKE_SERVER, name)
    }

    /// Installs the fake client as `testsuite/<name>`.
    pub fn install_client(&self, name: &str) -> Result<()> {
        self.install(FAKE_CLIENT, name)
    }

    fn install(&self, from: &str, name: &str) -> Result<()> {
        let to = self.testsuite_dir().join(format!("{name}{EXE_SUFFIX}"));
        fs::copy(from, &to).wrap_err_with(|| format!("failed to install {name}"))?;
        Ok(())
    }

    /// Writes a configuration file to the shared `tests/confs` directory.
    pub fn write_conf(&self, name: &str, contents: &str) -> Result<Utf8PathBuf> {
        write_file(&self.src_dir.join("tests/confs").join(name), contents)
    }

    /// Writes a configuration file to the test's own source directory.
    pub fn write_test_conf(&self, name: &str, contents: &str) -> Result<Utf8PathBuf> {
        write_file(&self.src_dir.join(TEST_NAME).join(name), contents)
    }

    /// Writes the generated suite config, `testsuite/tests/config.toml`.
    pub fn write_suite_config(&self, contents: &str) -> Result<()> {
        let path = self.testsuite_dir().join(SuiteConfig::CONFIG_PATH);
        fs::create_dir_all(path.parent().expect("config path has a parent"))?;
        write_file(&path, contents)?;
        Ok(())
    }

    pub fn settings(&self, rlimit_secs: u64, coverage: bool) -> SuiteSettings {
        SuiteSettingsBuilder::new(TEST_NAME)
            .set_src_dir(self.src_dir.clone())
            .set_build_dir(self.build_dir.clone())
            .set_log_dir(self.log_dir.clone())
            .set_resource_limit(Duration::from_secs(rlimit_secs))
            .set_coverage(coverage)
            .build()
            .expect("fixture settings are valid")
    }

    #[track_caller]
    pub fn runner(&self, rlimit_secs: u64) -> TestRunner {
        self.make_runner(self.settings(rlimit_secs, false))
    }

    /// Returns a runner in coverage mode. The coverage tool must be configured with
    /// [`Self::write_suite_config`] first.
    #[track_caller]
    pub fn coverage_runner(&self, rlimit_secs: u64) -> TestRunner {
        self.make_runner(self.settings(rlimit_secs, true))
    }

    #[track_caller]
    fn make_runner(&self, settings: SuiteSettings) -> TestRunner {
        let config = SuiteConfig::from_sources(settings.base_dir(), None).unwrap();
        TestRunner::new(settings, config).unwrap()
    }

    /// Returns an orbtest invocation with the testsuite environment pointing at this fixture.
    pub fn cli(&self, rlimit_secs: u64) -> OrbtestCli {
        let mut cli = OrbtestCli::new(ORBTEST_DUP);
        cli.env("TEST_NAME", TEST_NAME)
            .env("SRC_DIR", &self.src_dir)
            .env("BUILD_DIR", &self.build_dir)
            .env("LOG_DIR", &self.log_dir)
            .env("RLIMIT", rlimit_secs.to_string())
            .env("COVERAGE", "False");
        cli
    }
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<Utf8PathBuf> {
    fs::write(path, contents)?;
    Ok(path.to_owned())
}

/// Returns the pid the fake server printed to its capture file.
pub fn server_pid(server_output: &str) -> Option<u32> {
    server_output
        .lines()
        .find_map(|line| line.strip_prefix("pid = "))
        .and_then(|pid| pid.trim().parse().ok())
}
