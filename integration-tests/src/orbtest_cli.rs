// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use std::{
    borrow::Cow,
    collections::HashMap,
    ffi::OsString,
    fmt,
    process::{Command, ExitStatus},
};

/// Environment variables the testsuite exports. They're cleared before running orbtest so that the
/// ambient environment doesn't leak into tests.
pub const SUITE_ENV_VARS: &[&str] = &[
    "RLIMIT",
    "TEST_NAME",
    "SRC_DIR",
    "BUILD_DIR",
    "LOG_DIR",
    "COVERAGE",
    "VERBOSE",
    "ORBTEST_LOG",
    "POLYORB_CONF",
];

#[derive(Clone, Debug)]
pub struct OrbtestCli {
    bin: Utf8PathBuf,
    args: Vec<String>,
    envs: HashMap<OsString, OsString>,
}

impl OrbtestCli {
    pub fn new(bin: impl Into<Utf8PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            args: vec!["--color=never".to_owned()],
            envs: HashMap::new(),
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(&mut self, arg: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(arg.into_iter().map(Into::into));
        self
    }

    pub fn env(&mut self, k: impl Into<OsString>, v: impl Into<OsString>) -> &mut Self {
        self.envs.insert(k.into(), v.into());
        self
    }

    pub fn output(&self) -> OrbtestOutput {
        let mut command = Command::new(&self.bin);
        command.args(&self.args);
        for var in SUITE_ENV_VARS {
            command.env_remove(var);
        }
        command.envs(&self.envs);
        let output = command.output().expect("failed to execute");

        OrbtestOutput {
            command,
            exit_status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

pub struct OrbtestOutput {
    pub command: Command,
    pub exit_status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl OrbtestOutput {
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status.code()
    }

    pub fn stdout_as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

impl fmt::Display for OrbtestOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = self.command.get_program().to_string_lossy();
        let args: Vec<_> = self
            .command
            .get_args()
            .map(|arg| arg.to_string_lossy())
            .collect();
        write!(
            f,
            "command: {} {}\nexit code: {:?}\n\
                   --- stdout ---\n{}\n\n--- stderr ---\n{}\n\n",
            shell_words::quote(&program),
            shell_words::join(&args),
            self.exit_status.code(),
            self.stdout_as_str(),
            self.stderr_as_str(),
        )
    }
}

// Make Debug output the same as Display output, so `.unwrap()` and `.expect()` are nicer.
impl fmt::Debug for OrbtestOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
