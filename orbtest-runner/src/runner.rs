// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running test scenarios.
//!
//! The main structure in this module is [`TestRunner`].

use crate::{
    config::SuiteConfig,
    coverage::{CoverageTool, build_run_invocation},
    env::EnvironmentMap,
    errors::{ChildRunError, MalformedIorLine, RunnerBuildError, SetupError},
    paths::{resolve_conf_path, resolve_executable},
    process::{ChildCommand, IorScan, ServerProcess, run_captured},
    settings::SuiteSettings,
    verdict::{Verdict, check_output},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, io, process::ExitStatus, time::Duration};
use thiserror::Error;

pub use crate::process::ChildExit;

/// The outcome of a test scenario.
#[derive(Debug)]
pub enum TestOutcome {
    /// The success marker was found in the captured output.
    Passed,

    /// The captured output exists but doesn't contain the success marker.
    Failed,

    /// No verdict could be derived.
    NoVerdict(NoVerdictReason),
}

impl TestOutcome {
    /// Returns the verdict, if there is one.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            TestOutcome::Passed => Some(Verdict::Passed),
            TestOutcome::Failed => Some(Verdict::Failed),
            TestOutcome::NoVerdict(_) => None,
        }
    }

    /// Returns true if the test passed.
    pub fn is_success(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

impl From<Verdict> for TestOutcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Passed => TestOutcome::Passed,
            Verdict::Failed => TestOutcome::Failed,
        }
    }
}

/// Why a scenario produced no verdict.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NoVerdictReason {
    /// The executable whose output decides the verdict never produced a capture file.
    #[error("no output captured at `{output_file}`")]
    OutputMissing {
        /// The expected capture file.
        output_file: Utf8PathBuf,
    },

    /// The capture file couldn't be read.
    #[error("failed to read captured output at `{output_file}`")]
    ReadOutput {
        /// The capture file.
        output_file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// The server's output ended before it printed an IOR.
    #[error("server died before printing an IOR{}", DisplayExitStatus(.status))]
    ServerDied {
        /// The server's exit status, or `None` if it closed its output without exiting.
        status: Option<ExitStatus>,
    },

    /// The server didn't print an IOR within the resource limit.
    #[error("server didn't print an IOR within {}s", .limit.as_secs())]
    ServerTimedOut {
        /// The resource limit.
        limit: Duration,
    },

    /// The server printed a malformed IOR, so the client was not run.
    #[error("server printed a malformed IOR")]
    MalformedIor(#[source] MalformedIorLine),

    /// Running a child process failed.
    #[error("error while running the scenario")]
    ChildRun(#[source] ChildRunError),
}

struct DisplayExitStatus<'a>(&'a Option<ExitStatus>);

impl fmt::Display for DisplayExitStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(status) => write!(f, " ({status})"),
            None => Ok(()),
        }
    }
}

/// Runs test scenarios for a single test.
///
/// Created using [`TestRunner::new`].
#[derive(Debug)]
pub struct TestRunner {
    settings: SuiteSettings,
    config: SuiteConfig,
    coverage: Option<CoverageTool>,
    runtime: tokio::runtime::Runtime,
}

impl TestRunner {
    /// Creates a new test runner.
    ///
    /// In coverage mode, this resolves the coverage tool.
    pub fn new(settings: SuiteSettings, config: SuiteConfig) -> Result<Self, RunnerBuildError> {
        let coverage = settings
            .coverage()
            .then(|| CoverageTool::new(config.coverage(), config.use_installed()))
            .transpose()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RunnerBuildError::TokioRuntimeCreate)?;

        Ok(Self {
            settings,
            config,
            coverage,
            runtime,
        })
    }

    /// Returns the settings this runner was created with.
    pub fn settings(&self) -> &SuiteSettings {
        &self.settings
    }

    /// Runs a single executable and derives the verdict from its output.
    ///
    /// `command` is relative to the testsuite build directory. `conf`, if given, is passed to the
    /// executable through the configuration environment variable.
    pub fn run_local(
        &self,
        command: &str,
        conf: Option<&str>,
        args: &[String],
    ) -> Result<TestOutcome, SetupError> {
        tracing::info!(
            "running {} (config={})",
            shell_words::join(std::iter::once(command).chain(args.iter().map(String::as_str))),
            DisplayConf(conf),
        );

        let conf_path = self.resolve_conf(conf)?;
        let executable = resolve_executable(&self.settings, command)?;
        self.create_output_dir()?;

        let env = self.child_env(conf_path.as_deref());
        let mut argv = vec![executable.to_string()];
        argv.extend(args.iter().cloned());
        let command = ChildCommand::new(build_run_invocation(argv, self.coverage.as_ref()), &env);
        if self.settings.verbose() {
            tracing::info!("RUN: {command}");
        } else {
            tracing::debug!("RUN: {command}");
        }

        let output_file = self.settings.output_file("local");
        let outcome = self.runtime.block_on(async {
            match run_captured(command, &output_file, self.settings.resource_limit()).await {
                Ok(exit) => tracing::debug!("{executable}: {exit}"),
                Err(error) => return TestOutcome::NoVerdict(NoVerdictReason::ChildRun(error)),
            }
            self.run_coverage_analysis(&executable).await;
            self.outcome_from(&output_file)
        });

        Ok(log_outcome(outcome))
    }

    /// Runs a client-server scenario.
    ///
    /// The server is started first. Once it prints its IOR, the client is run with the IOR as its
    /// only argument, and the verdict is derived from the client's output. The server is
    /// terminated before this returns, whatever the outcome.
    pub fn run_client_server(
        &self,
        client_cmd: &str,
        client_conf: Option<&str>,
        server_cmd: &str,
        server_conf: Option<&str>,
    ) -> Result<TestOutcome, SetupError> {
        tracing::info!(
            "running client {client_cmd} (config={}), server {server_cmd} (config={})",
            DisplayConf(client_conf),
            DisplayConf(server_conf),
        );

        let client = resolve_executable(&self.settings, client_cmd)?;
        let server = resolve_executable(&self.settings, server_cmd)?;
        let client_conf = self.resolve_conf(client_conf)?;
        let server_conf = self.resolve_conf(server_conf)?;
        self.create_output_dir()?;

        let scenario = ClientServer {
            server_env: self.child_env(server_conf.as_deref()),
            client_env: self.child_env(client_conf.as_deref()),
            client,
            server,
        };
        let outcome = self.runtime.block_on(self.client_server_scenario(scenario));

        Ok(log_outcome(outcome))
    }

    async fn client_server_scenario(&self, scenario: ClientServer) -> TestOutcome {
        let server_command = ChildCommand::new(
            build_run_invocation(vec![scenario.server.to_string()], self.coverage.as_ref()),
            &scenario.server_env,
        );
        tracing::info!("RUN server: {server_command}");

        let mut server = match ServerProcess::spawn(
            server_command,
            &self.settings.output_file("server"),
            self.config.server_grace_period(),
        ) {
            Ok(server) => server,
            Err(error) => return TestOutcome::NoVerdict(NoVerdictReason::ChildRun(error)),
        };

        let res = self.run_against_server(&mut server, &scenario).await;

        if let Err(error) = server.terminate().await {
            tracing::warn!("{error}");
        }

        match res {
            Ok(output_file) => self.outcome_from(&output_file),
            Err(reason) => TestOutcome::NoVerdict(reason),
        }
    }

    async fn run_against_server(
        &self,
        server: &mut ServerProcess,
        scenario: &ClientServer,
    ) -> Result<Utf8PathBuf, NoVerdictReason> {
        let limit = self.settings.resource_limit();
        let ior = match server
            .wait_for_ior(limit)
            .await
            .map_err(NoVerdictReason::ChildRun)?
        {
            IorScan::Found(ior) => ior,
            IorScan::Malformed(error) => {
                tracing::error!("{error}");
                return Err(NoVerdictReason::MalformedIor(error));
            }
            IorScan::Exited(status) => return Err(NoVerdictReason::ServerDied { status }),
            IorScan::TimedOut => return Err(NoVerdictReason::ServerTimedOut { limit }),
        };
        tracing::info!("{ior}");

        let client_command = ChildCommand::new(
            build_run_invocation(
                vec![scenario.client.to_string(), ior.to_string()],
                self.coverage.as_ref(),
            ),
            &scenario.client_env,
        );
        tracing::info!("RUN client: {client_command}");

        let output_file = self.settings.output_file("client");
        let exit = run_captured(client_command, &output_file, limit)
            .await
            .map_err(NoVerdictReason::ChildRun)?;
        tracing::debug!("{}: {exit}", scenario.client);

        for executable in [&scenario.client, &scenario.server] {
            self.run_coverage_analysis(executable).await;
        }

        Ok(output_file)
    }

    /// Turns the trace left by `executable` into a report. Does nothing outside coverage mode.
    ///
    /// Failures are logged and don't affect the verdict.
    async fn run_coverage_analysis(&self, executable: &Utf8Path) {
        let Some(coverage) = &self.coverage else {
            return;
        };

        let file_name = executable.file_name().unwrap_or(executable.as_str());
        let output_file = self.settings.output_file(&format!("{file_name}.trace"));
        let command = ChildCommand::new(
            coverage.report_command(executable),
            &EnvironmentMap::empty(),
        );
        tracing::debug!("RUN coverage: {command}");

        match run_captured(command, &output_file, self.settings.resource_limit()).await {
            Ok(ChildExit::Exited(status)) if status.success() => {}
            Ok(exit) => {
                tracing::warn!("coverage analysis of {executable} failed: {exit}");
            }
            Err(error) => {
                tracing::warn!("coverage analysis of {executable} failed: {error}");
            }
        }
    }

    fn resolve_conf(&self, conf: Option<&str>) -> Result<Option<Utf8PathBuf>, SetupError> {
        conf.map(|conf| resolve_conf_path(&self.settings, conf))
            .transpose()
            .map_err(SetupError::from)
    }

    fn child_env(&self, conf_path: Option<&Utf8Path>) -> EnvironmentMap {
        EnvironmentMap::with_conf(self.config.conf_env_var(), conf_path.map(Utf8Path::as_str))
    }

    fn create_output_dir(&self) -> Result<(), SetupError> {
        let dir = self.settings.output_dir();
        std::fs::create_dir_all(dir).map_err(|err| SetupError::CreateOutputDir {
            dir: dir.to_owned(),
            err,
        })
    }

    fn outcome_from(&self, output_file: &Utf8Path) -> TestOutcome {
        match check_output(self.settings.test_name(), output_file) {
            Ok(Some(verdict)) => verdict.into(),
            Ok(None) => TestOutcome::NoVerdict(NoVerdictReason::OutputMissing {
                output_file: output_file.to_owned(),
            }),
            Err(err) => TestOutcome::NoVerdict(NoVerdictReason::ReadOutput {
                output_file: output_file.to_owned(),
                err,
            }),
        }
    }
}

struct ClientServer {
    client: Utf8PathBuf,
    server: Utf8PathBuf,
    client_env: EnvironmentMap,
    server_env: EnvironmentMap,
}

struct DisplayConf<'a>(Option<&'a str>);

impl fmt::Display for DisplayConf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0.unwrap_or("none"))
    }
}

fn log_outcome(outcome: TestOutcome) -> TestOutcome {
    if let TestOutcome::NoVerdict(reason) = &outcome {
        let mut message = reason.to_string();
        let mut source = std::error::Error::source(reason);
        while let Some(error) = source {
            message.push_str(": ");
            message.push_str(&error.to_string());
            source = error.source();
        }
        tracing::error!("no verdict: {message}");
    }
    outcome
}
