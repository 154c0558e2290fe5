// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by orbtest.

use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use std::{fmt, io};
use thiserror::Error;

/// An executable required by a scenario does not exist.
#[derive(Clone, Debug, Error)]
#[error("executable `{path}` not found")]
pub struct ExecutableNotFound {
    path: Utf8PathBuf,
}

impl ExecutableNotFound {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path that was looked up.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// A configuration file passed to an executable could not be located.
#[derive(Clone, Debug, Error)]
pub struct ConfigNotFound {
    name: String,
    searched: Vec<Utf8PathBuf>,
}

impl ConfigNotFound {
    pub(crate) fn new(name: impl Into<String>, searched: Vec<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            searched,
        }
    }

    /// Returns the configuration file name as requested.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the locations that were searched, in order.
    pub fn searched(&self) -> &[Utf8PathBuf] {
        &self.searched
    }
}

impl fmt::Display for ConfigNotFound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "configuration file `{}` not found", self.name)?;
        if !self.searched.is_empty() {
            write!(f, " (searched: ")?;
            for (idx, path) in self.searched.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{path}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// A tool could not be located on `PATH`.
#[derive(Clone, Debug, Error)]
#[error("failed to locate `{tool}` on PATH")]
pub struct ToolNotFound {
    tool: String,
}

impl ToolNotFound {
    pub(crate) fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

/// A server printed a line containing `IOR:` that isn't a well-formed IOR.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("malformed IOR line: {line:?}")]
pub struct MalformedIorLine {
    line: String,
}

impl MalformedIorLine {
    pub(crate) fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }

    /// Returns the offending line, including its terminator if any.
    pub fn line(&self) -> &str {
        &self.line
    }
}

/// An error detected before any process is spawned. These are fatal for the scenario.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetupError {
    /// An executable was not found.
    #[error(transparent)]
    ExecutableNotFound(#[from] ExecutableNotFound),

    /// A configuration file was not found.
    #[error(transparent)]
    ConfigNotFound(#[from] ConfigNotFound),

    /// The output directory could not be created.
    #[error("failed to create output directory `{dir}`")]
    CreateOutputDir {
        /// The directory that failed to be created.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },
}

/// An error that occurred while running a child process.
///
/// In a client-server scenario these errors are logged and the scenario produces no verdict.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChildRunError {
    /// The capture file for the child's output could not be created.
    #[error("failed to create capture file `{path}`")]
    CaptureFile {
        /// The capture file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// The child process could not be spawned.
    #[error("failed to spawn `{command}`")]
    Spawn {
        /// The command line, shell-quoted.
        command: String,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// Waiting for the child process failed.
    #[error("failed to wait for `{command}`")]
    Wait {
        /// The command line, shell-quoted.
        command: String,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// Reading the child's output failed.
    #[error("failed to read output of `{command}`")]
    ReadOutput {
        /// The command line, shell-quoted.
        command: String,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// Writing the child's output to its capture file failed.
    #[error("failed to write output to `{path}`")]
    WriteCapture {
        /// The capture file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },
}

/// A process could not be terminated.
#[derive(Debug, Error)]
#[error("process {pid} is still running after termination was requested")]
pub struct TerminateError {
    pid: u32,
    #[source]
    err: Option<io::Error>,
}

impl TerminateError {
    #[cfg_attr(unix, expect(dead_code))]
    pub(crate) fn new(pid: u32, err: Option<io::Error>) -> Self {
        Self { pid, err }
    }
}

/// An error that occurred while loading the suite configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct SuiteConfigError {
    config_file: Option<Utf8PathBuf>,
    #[source]
    err: ConfigError,
}

impl SuiteConfigError {
    pub(crate) fn new(config_file: Option<Utf8PathBuf>, err: ConfigError) -> Self {
        Self { config_file, err }
    }

    /// Returns the explicitly requested config file, if any.
    pub fn config_file(&self) -> Option<&Utf8Path> {
        self.config_file.as_deref()
    }
}

impl fmt::Display for SuiteConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.config_file {
            Some(file) => write!(f, "failed to parse suite config at `{file}`"),
            None => write!(f, "failed to parse suite config"),
        }
    }
}

/// An error that occurred while building [`SuiteSettings`](crate::settings::SuiteSettings).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SuiteSettingsError {
    /// A required setting was not provided.
    #[error("required setting `{0}` was not provided")]
    Missing(&'static str),

    /// The test name is empty or contains a path separator.
    #[error("invalid test name `{0}`: must be non-empty and must not contain path separators")]
    InvalidTestName(String),

    /// The resource limit was zero.
    #[error("resource limit must be at least one second")]
    ZeroResourceLimit,
}

/// An error that occurred while building a [`TestRunner`](crate::runner::TestRunner).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerBuildError {
    /// An error occurred while creating the Tokio runtime.
    #[error("error creating Tokio runtime")]
    TokioRuntimeCreate(#[source] io::Error),

    /// Coverage mode was requested but the coverage tool couldn't be found.
    #[error("failed to resolve the coverage tool")]
    CoverageTool(#[from] ToolNotFound),
}
