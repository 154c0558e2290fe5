// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test settings: directories, the test name, and limits.

use crate::errors::SuiteSettingsError;
use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;

/// Settings for a single test, derived from the testsuite environment.
///
/// Created through [`SuiteSettingsBuilder`], immutable afterwards.
#[derive(Clone, Debug)]
pub struct SuiteSettings {
    test_name: String,
    src_dir: Utf8PathBuf,
    base_dir: Utf8PathBuf,
    output_dir: Utf8PathBuf,
    resource_limit: Duration,
    coverage: bool,
    verbose: bool,
}

impl SuiteSettings {
    /// The name of the test being run.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// The testsuite source directory.
    pub fn src_dir(&self) -> &Utf8Path {
        &self.src_dir
    }

    /// The directory test executables are resolved against: `<build dir>/testsuite`.
    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// The directory holding configuration files shared between tests.
    pub fn conf_dir(&self) -> Utf8PathBuf {
        self.src_dir.join("tests").join("confs")
    }

    /// The source directory specific to this test.
    pub fn test_src_dir(&self) -> Utf8PathBuf {
        self.src_dir.join(&self.test_name)
    }

    /// The directory captured output is written to: `<log dir>/<test name>`.
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Returns the path of a capture file for this test: `<output dir>/<test name>.<suffix>`.
    pub fn output_file(&self, suffix: &str) -> Utf8PathBuf {
        self.output_dir.join(format!("{}.{suffix}", self.test_name))
    }

    /// The maximum wall-clock time any single executable may run for.
    pub fn resource_limit(&self) -> Duration {
        self.resource_limit
    }

    /// Whether executables are run under the coverage tool.
    pub fn coverage(&self) -> bool {
        self.coverage
    }

    /// Whether to log command lines for local runs.
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Builder for [`SuiteSettings`].
#[derive(Clone, Debug, Default)]
pub struct SuiteSettingsBuilder {
    test_name: String,
    src_dir: Option<Utf8PathBuf>,
    build_dir: Option<Utf8PathBuf>,
    log_dir: Option<Utf8PathBuf>,
    resource_limit: Option<Duration>,
    coverage: bool,
    verbose: bool,
}

impl SuiteSettingsBuilder {
    /// Creates a new builder for the given test.
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            ..Default::default()
        }
    }

    /// Sets the testsuite source directory.
    pub fn set_src_dir(&mut self, src_dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.src_dir = Some(src_dir.into());
        self
    }

    /// Sets the product build directory. Test executables live under its `testsuite`
    /// subdirectory.
    pub fn set_build_dir(&mut self, build_dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.build_dir = Some(build_dir.into());
        self
    }

    /// Sets the log directory. Output is captured under a subdirectory named after the test.
    pub fn set_log_dir(&mut self, log_dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    /// Sets the maximum wall-clock time for each executable.
    pub fn set_resource_limit(&mut self, resource_limit: Duration) -> &mut Self {
        self.resource_limit = Some(resource_limit);
        self
    }

    /// Enables or disables coverage mode.
    pub fn set_coverage(&mut self, coverage: bool) -> &mut Self {
        self.coverage = coverage;
        self
    }

    /// Enables or disables verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) -> &mut Self {
        self.verbose = verbose;
        self
    }

    /// Builds the settings.
    pub fn build(&self) -> Result<SuiteSettings, SuiteSettingsError> {
        if self.test_name.is_empty() || self.test_name.contains(['/', '\\']) {
            return Err(SuiteSettingsError::InvalidTestName(self.test_name.clone()));
        }
        let src_dir = self
            .src_dir
            .clone()
            .ok_or(SuiteSettingsError::Missing("src-dir"))?;
        let build_dir = self
            .build_dir
            .as_ref()
            .ok_or(SuiteSettingsError::Missing("build-dir"))?;
        let log_dir = self
            .log_dir
            .as_ref()
            .ok_or(SuiteSettingsError::Missing("log-dir"))?;
        let resource_limit = self
            .resource_limit
            .ok_or(SuiteSettingsError::Missing("rlimit"))?;
        if resource_limit < Duration::from_secs(1) {
            return Err(SuiteSettingsError::ZeroResourceLimit);
        }

        Ok(SuiteSettings {
            output_dir: log_dir.join(&self.test_name),
            base_dir: build_dir.join("testsuite"),
            test_name: self.test_name.clone(),
            src_dir,
            resource_limit,
            coverage: self.coverage,
            verbose: self.verbose,
        })
    }
}
