// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line parsing and command routing.

use crate::{
    ExpectedError, Result,
    exit_codes::OrbtestExitCode,
    output::{OutputContext, OutputOpts, parse_testsuite_bool},
};
use camino::Utf8PathBuf;
use clap::{ArgAction, Args, Subcommand};
use orbtest_runner::{
    config::SuiteConfig,
    errors::SuiteSettingsError,
    paths::tool_path,
    runner::TestRunner,
    settings::{SuiteSettings, SuiteSettingsBuilder},
    verdict::check_output,
};
use std::{io::Write, time::Duration};

/// Runs ORB test scenarios and reports a verdict through the exit code.
///
/// Exit codes: 0 if the test passed, 1 if it failed, 2 if no verdict could be derived, 96 on setup
/// errors.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct OrbtestApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    suite: SuiteOpts,

    #[clap(subcommand)]
    command: Command,
}

impl OrbtestApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self) -> Result<i32> {
        let verbose = self.output.verbose;
        match self.command {
            Command::Local {
                command,
                conf,
                args,
            } => {
                let runner = self.suite.make_runner(verbose)?;
                let outcome = runner.run_local(&command, conf.as_deref(), &args)?;
                Ok(OrbtestExitCode::for_outcome(&outcome))
            }
            Command::ClientServer {
                client,
                server,
                client_conf,
                server_conf,
            } => {
                let runner = self.suite.make_runner(verbose)?;
                let outcome = runner.run_client_server(
                    &client,
                    client_conf.as_deref(),
                    &server,
                    server_conf.as_deref(),
                )?;
                Ok(OrbtestExitCode::for_outcome(&outcome))
            }
            Command::CheckOutput { output_file } => {
                let test_name = self
                    .suite
                    .test_name
                    .as_deref()
                    .or_else(|| output_file.file_stem())
                    .unwrap_or_default();
                match check_output(test_name, &output_file) {
                    Ok(Some(verdict)) if verdict.is_success() => Ok(OrbtestExitCode::OK),
                    Ok(Some(_)) => Ok(OrbtestExitCode::TEST_FAILED),
                    Ok(None) => {
                        tracing::error!("no output captured at {output_file}");
                        Ok(OrbtestExitCode::NO_VERDICT)
                    }
                    Err(err) => Err(ExpectedError::read_output(output_file, err)),
                }
            }
            Command::ToolPath { name, dir } => {
                let base_dir = self.suite.base_dir()?;
                let config =
                    SuiteConfig::from_sources(&base_dir, self.suite.config_file.as_deref())?;
                let dir = dir.unwrap_or(base_dir);
                let path = tool_path(config.use_installed(), &dir, &name)?;

                writeln!(std::io::stdout(), "{path}").map_err(ExpectedError::write_output)?;
                Ok(OrbtestExitCode::OK)
            }
        }
    }
}

/// Settings describing the test being run. Each one falls back to the variable exported by the
/// testsuite.
#[derive(Debug, Args)]
#[command(next_help_heading = "Suite options")]
struct SuiteOpts {
    /// Name of the test, used to name its output files
    #[arg(long, global = true, env = "TEST_NAME", value_name = "NAME")]
    test_name: Option<String>,

    /// Source directory of the testsuite
    #[arg(long, global = true, env = "SRC_DIR", value_name = "DIR")]
    src_dir: Option<Utf8PathBuf>,

    /// Build directory; test executables live in its `testsuite` subdirectory
    #[arg(long, global = true, env = "BUILD_DIR", value_name = "DIR")]
    build_dir: Option<Utf8PathBuf>,

    /// Directory where output is captured, one subdirectory per test
    #[arg(long, global = true, env = "LOG_DIR", value_name = "DIR")]
    log_dir: Option<Utf8PathBuf>,

    /// Maximum run time of each executable, in seconds
    #[arg(long, global = true, env = "RLIMIT", value_name = "SECS")]
    rlimit: Option<u64>,

    /// Run executables under the coverage tool
    #[arg(
        long,
        global = true,
        env = "COVERAGE",
        action = ArgAction::Set,
        value_parser = parse_testsuite_bool,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_name = "BOOL",
    )]
    coverage: bool,

    /// Suite config file [default: BUILD_DIR/testsuite/tests/config.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl SuiteOpts {
    fn make_settings(&self, verbose: bool) -> Result<SuiteSettings, SuiteSettingsError> {
        let test_name = self
            .test_name
            .clone()
            .ok_or(SuiteSettingsError::Missing("test-name"))?;

        let mut builder = SuiteSettingsBuilder::new(test_name);
        if let Some(src_dir) = &self.src_dir {
            builder.set_src_dir(src_dir.clone());
        }
        if let Some(build_dir) = &self.build_dir {
            builder.set_build_dir(build_dir.clone());
        }
        if let Some(log_dir) = &self.log_dir {
            builder.set_log_dir(log_dir.clone());
        }
        if let Some(rlimit) = self.rlimit {
            builder.set_resource_limit(Duration::from_secs(rlimit));
        }
        builder.set_coverage(self.coverage).set_verbose(verbose);
        builder.build()
    }

    fn make_runner(&self, verbose: bool) -> Result<TestRunner> {
        let settings = self.make_settings(verbose)?;
        let config = SuiteConfig::from_sources(settings.base_dir(), self.config_file.as_deref())?;
        Ok(TestRunner::new(settings, config)?)
    }

    fn base_dir(&self) -> Result<Utf8PathBuf, SuiteSettingsError> {
        self.build_dir
            .as_deref()
            .map(|build_dir| build_dir.join("testsuite"))
            .ok_or(SuiteSettingsError::Missing("build-dir"))
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single executable and check its output
    Local {
        /// Executable, relative to BUILD_DIR/testsuite
        command: String,

        /// Configuration file passed to the executable
        #[arg(long, value_name = "FILE")]
        conf: Option<String>,

        /// Arguments passed to the executable
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Run a server, then a client with the server's IOR, and check the client's output
    ClientServer {
        /// Client executable, relative to BUILD_DIR/testsuite
        client: String,

        /// Server executable, relative to BUILD_DIR/testsuite
        server: String,

        /// Configuration file passed to the client
        #[arg(long, value_name = "FILE")]
        client_conf: Option<String>,

        /// Configuration file passed to the server
        #[arg(long, value_name = "FILE")]
        server_conf: Option<String>,
    },

    /// Check a captured output file for the success marker
    CheckOutput {
        /// The capture file
        output_file: Utf8PathBuf,
    },

    /// Print the path a testsuite tool is run from
    ToolPath {
        /// Tool name
        name: String,

        /// Directory holding the tool when not using an installed product [default:
        /// BUILD_DIR/testsuite]
        #[arg(long, value_name = "DIR")]
        dir: Option<Utf8PathBuf>,
    },
}
