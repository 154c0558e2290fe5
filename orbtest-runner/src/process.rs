// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    env::EnvironmentMap,
    errors::{ChildRunError, MalformedIorLine, TerminateError},
    ior::{IorToken, LineAccumulator, extract_ior},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{
    fmt,
    process::{ExitStatus, Stdio},
    time::Duration,
};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
    process::{Child, ChildStdout},
    task::JoinHandle,
};

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        use unix as os;
    } else if #[cfg(windows)] {
        mod windows;
        use windows as os;
    } else {
        compile_error!("unsupported target platform");
    }
}

/// The size of each read from a server's standard output.
const CHUNK_SIZE: usize = 4 * 1024;

/// A command line to be run as a child process, along with the environment it gets.
pub(crate) struct ChildCommand {
    command: std::process::Command,
    command_line: String,
}

impl ChildCommand {
    pub(crate) fn new(argv: Vec<String>, env: &EnvironmentMap) -> Self {
        let command_line = format!("{env}{}", shell_words::join(&argv));
        let mut args = argv.into_iter();
        let program = args.next().unwrap_or_default();

        let mut command = std::process::Command::new(program);
        command.args(args).stdin(Stdio::null());
        env.apply_env(&mut command);

        Self {
            command,
            command_line,
        }
    }
}

impl fmt::Display for ChildCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.command_line)
    }
}

/// How a child run under a resource limit finished.
#[derive(Copy, Clone, Debug)]
pub enum ChildExit {
    /// The child exited on its own.
    Exited(ExitStatus),

    /// The child exceeded the resource limit and was killed.
    TimedOut,
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChildExit::Exited(status) => write!(f, "{status}"),
            ChildExit::TimedOut => f.write_str("killed after exceeding the resource limit"),
        }
    }
}

/// Runs a command to completion with stdout and stderr combined into `output_file`.
///
/// The child is killed if it's still running after `limit`.
pub(crate) async fn run_captured(
    command: ChildCommand,
    output_file: &Utf8Path,
    limit: Duration,
) -> Result<ChildExit, ChildRunError> {
    let capture_err = |err| ChildRunError::CaptureFile {
        path: output_file.to_owned(),
        err,
    };
    let stdout = std::fs::File::create(output_file).map_err(capture_err)?;
    let stderr = stdout.try_clone().map_err(capture_err)?;

    let ChildCommand {
        mut command,
        command_line,
    } = command;
    command.stdout(stdout).stderr(stderr);
    let mut command = tokio::process::Command::from(command);
    command.kill_on_drop(true);

    let mut child = command.spawn().map_err(|err| ChildRunError::Spawn {
        command: command_line.clone(),
        err,
    })?;

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(Ok(status)) => Ok(ChildExit::Exited(status)),
        Ok(Err(err)) => Err(ChildRunError::Wait {
            command: command_line,
            err,
        }),
        Err(_) => {
            tracing::warn!(
                "`{command_line}` still running after {}s, killing it",
                limit.as_secs()
            );
            // An error here means the child exited in the meantime.
            _ = child.kill().await;
            Ok(ChildExit::TimedOut)
        }
    }
}

/// The result of scanning a server's output for its IOR.
#[derive(Debug)]
pub(crate) enum IorScan {
    /// A well-formed IOR was printed.
    Found(IorToken),

    /// A line mentioning an IOR was printed, but it wasn't well-formed.
    Malformed(MalformedIorLine),

    /// The server exited, or its output ended, before an IOR was printed. `None` means the server
    /// closed its output without exiting.
    Exited(Option<ExitStatus>),

    /// The server didn't print an IOR within the resource limit.
    TimedOut,
}

/// A server running in the background.
///
/// Its standard output is copied to a capture file. The process is killed when this is dropped;
/// [`ServerProcess::terminate`] asks it to exit first.
pub(crate) struct ServerProcess {
    child: Child,
    command_line: String,
    capture_path: Utf8PathBuf,
    grace_period: Duration,
    pending: Option<(ChildStdout, File)>,
    drain: Option<JoinHandle<Result<(), ChildRunError>>>,
}

impl ServerProcess {
    pub(crate) fn spawn(
        command: ChildCommand,
        output_file: &Utf8Path,
        grace_period: Duration,
    ) -> Result<Self, ChildRunError> {
        let capture =
            std::fs::File::create(output_file).map_err(|err| ChildRunError::CaptureFile {
                path: output_file.to_owned(),
                err,
            })?;

        let ChildCommand {
            mut command,
            command_line,
        } = command;
        command.stdout(Stdio::piped());
        let mut command = tokio::process::Command::from(command);
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|err| ChildRunError::Spawn {
            command: command_line.clone(),
            err,
        })?;
        let stdout = child.stdout.take().expect("stdout was set");

        Ok(Self {
            child,
            command_line,
            capture_path: output_file.to_owned(),
            grace_period,
            pending: Some((stdout, File::from_std(capture))),
            drain: None,
        })
    }

    /// Reads the server's output line by line until an IOR shows up, the output ends, or `limit`
    /// elapses.
    ///
    /// Whatever the result, the rest of the output keeps being copied to the capture file in the
    /// background until the server is terminated.
    pub(crate) async fn wait_for_ior(&mut self, limit: Duration) -> Result<IorScan, ChildRunError> {
        let Some((mut stdout, mut capture)) = self.pending.take() else {
            return Ok(IorScan::Exited(None));
        };
        let mut acc = LineAccumulator::new();

        let scan = tokio::time::timeout(
            limit,
            scan_for_ior(
                &mut self.child,
                &mut stdout,
                &mut capture,
                &mut acc,
                &self.command_line,
                &self.capture_path,
            ),
        )
        .await
        .unwrap_or(Ok(IorScan::TimedOut));

        self.drain = Some(tokio::spawn(drain_output(
            stdout,
            capture,
            acc,
            self.command_line.clone(),
            self.capture_path.clone(),
        )));

        scan
    }

    /// Terminates the server, then waits for the rest of its output to be captured.
    ///
    /// A server that already exited is not an error.
    pub(crate) async fn terminate(mut self) -> Result<(), TerminateError> {
        let res = os::terminate_child(&mut self.child, self.grace_period).await;

        if let Some(drain) = self.drain.take() {
            match tokio::time::timeout(self.grace_period, drain).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(error))) => {
                    tracing::warn!("{error}");
                }
                Ok(Err(join_error)) => {
                    tracing::warn!("capturing server output panicked: {join_error}");
                }
                Err(_) => {
                    // Most likely a grandchild is holding the pipe open.
                    tracing::warn!(
                        "server output still open after termination, {} may be incomplete",
                        self.capture_path
                    );
                }
            }
        }

        res
    }
}

async fn scan_for_ior(
    child: &mut Child,
    stdout: &mut ChildStdout,
    capture: &mut File,
    acc: &mut LineAccumulator,
    command_line: &str,
    capture_path: &Utf8Path,
) -> Result<IorScan, ChildRunError> {
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        tokio::select! {
            res = stdout.read(&mut buf) => {
                let n = res.map_err(|err| ChildRunError::ReadOutput {
                    command: command_line.to_owned(),
                    err,
                })?;
                if n == 0 {
                    // A trailing unterminated line is checked too: an IOR without its terminator
                    // is malformed.
                    let rest = std::mem::take(acc).finish();
                    if let Some(Err(error)) = rest.as_deref().map(extract_ior) {
                        return Ok(IorScan::Malformed(error));
                    }
                    return Ok(IorScan::Exited(None));
                }

                capture
                    .write_all(&buf[..n])
                    .await
                    .map_err(|err| ChildRunError::WriteCapture {
                        path: capture_path.to_owned(),
                        err,
                    })?;
                for line in acc.push(&buf[..n]) {
                    log_server_line(&line);
                    match extract_ior(&line) {
                        Ok(Some(ior)) => return Ok(IorScan::Found(ior)),
                        Ok(None) => {}
                        Err(error) => return Ok(IorScan::Malformed(error)),
                    }
                }
            }
            res = child.wait() => {
                let status = res.map_err(|err| ChildRunError::Wait {
                    command: command_line.to_owned(),
                    err,
                })?;
                // Output still in the pipe goes to the drain task.
                tracing::debug!("server exited with {status} before printing an IOR");
                return Ok(IorScan::Exited(Some(status)));
            }
        }
    }
}

async fn drain_output(
    mut stdout: ChildStdout,
    mut capture: File,
    mut acc: LineAccumulator,
    command_line: String,
    capture_path: Utf8PathBuf,
) -> Result<(), ChildRunError> {
    let write_err = |err| ChildRunError::WriteCapture {
        path: capture_path.clone(),
        err,
    };
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = stdout
            .read(&mut buf)
            .await
            .map_err(|err| ChildRunError::ReadOutput {
                command: command_line.clone(),
                err,
            })?;
        if n == 0 {
            break;
        }
        capture.write_all(&buf[..n]).await.map_err(write_err)?;
        for line in acc.push(&buf[..n]) {
            log_server_line(&line);
        }
    }
    if let Some(rest) = acc.finish() {
        log_server_line(&rest);
    }

    capture.flush().await.map_err(write_err)
}

fn log_server_line(line: &str) {
    tracing::debug!(target: "orbtest_runner::server", "{}", line.trim_end());
}
