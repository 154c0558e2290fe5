// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{exit_codes::OrbtestExitCode, output::StderrStyles};
use camino::Utf8PathBuf;
use orbtest_runner::errors::*;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that orbtest expects may happen, with a documented exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("invalid suite settings")]
    SuiteSettings {
        #[from]
        err: SuiteSettingsError,
    },
    #[error("suite config error")]
    SuiteConfig {
        #[from]
        err: SuiteConfigError,
    },
    #[error("test runner build error")]
    TestRunnerBuild {
        #[from]
        err: RunnerBuildError,
    },
    #[error("scenario setup error")]
    Setup {
        #[from]
        err: SetupError,
    },
    #[error("tool not found")]
    ToolNotFound {
        #[from]
        err: ToolNotFound,
    },
    #[error("failed to read captured output")]
    ReadOutput {
        output_file: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("error writing to output")]
    WriteOutput {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn read_output(output_file: Utf8PathBuf, err: std::io::Error) -> Self {
        Self::ReadOutput { output_file, err }
    }

    pub(crate) fn write_output(err: std::io::Error) -> Self {
        Self::WriteOutput { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::SuiteSettings { .. }
            | Self::SuiteConfig { .. }
            | Self::TestRunnerBuild { .. }
            | Self::Setup { .. }
            | Self::ToolNotFound { .. }
            | Self::ReadOutput { .. } => OrbtestExitCode::SETUP_ERROR,
            Self::WriteOutput { .. } => OrbtestExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr, followed by its chain of causes.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::SuiteSettings { err } => {
                tracing::error!("{err}");
                None
            }
            Self::SuiteConfig { err } => {
                match err.config_file() {
                    Some(file) => tracing::error!(
                        "failed to parse suite config at `{}`",
                        file.style(styles.bold)
                    ),
                    None => tracing::error!("failed to parse suite config"),
                }
                err.source()
            }
            Self::TestRunnerBuild { err } => {
                tracing::error!("failed to build test runner");
                Some(err as &dyn Error)
            }
            Self::Setup { err } => match err {
                SetupError::ExecutableNotFound(err) => {
                    tracing::error!(
                        "executable `{}` not found",
                        err.path().style(styles.bold)
                    );
                    None
                }
                SetupError::ConfigNotFound(err) => {
                    tracing::error!(
                        "configuration file `{}` not found",
                        err.name().style(styles.bold)
                    );
                    for path in err.searched() {
                        tracing::info!(target: "orbtest::no_heading", "  searched: {path}");
                    }
                    None
                }
                other => {
                    tracing::error!("{other}");
                    other.source()
                }
            },
            Self::ToolNotFound { err } => {
                tracing::error!("{err}");
                None
            }
            Self::ReadOutput { output_file, err } => {
                tracing::error!(
                    "failed to read captured output at `{}`",
                    output_file.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::WriteOutput { err } => {
                tracing::error!("error writing to output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: "orbtest::no_heading", "\nCaused by:\n  {err}");
            next_error = err.source();
        }
    }
}
