// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coverage instrumentation.
//!
//! In coverage mode every test executable is run under the coverage tool, which writes a trace
//! file named `<executable>.trace`. Once the executable is done, a second invocation of the tool
//! turns the trace into an annotated report.

use crate::{config::CoverageConfig, errors::ToolNotFound, paths::find_on_path};
use camino::Utf8Path;

/// A resolved coverage tool.
#[derive(Clone, Debug)]
pub struct CoverageTool {
    program: String,
    config: CoverageConfig,
}

impl CoverageTool {
    /// Resolves the coverage tool described by `config`.
    ///
    /// With `use_installed`, the tool must be found on `PATH`; otherwise it's invoked by name.
    pub fn new(config: &CoverageConfig, use_installed: bool) -> Result<Self, ToolNotFound> {
        let program = if use_installed {
            find_on_path(&config.tool)?.into_string()
        } else {
            config.tool.clone()
        };
        Ok(Self {
            program,
            config: config.clone(),
        })
    }

    /// Returns the program used to invoke the tool.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the command line that turns the trace for `executable` into a report.
    pub fn report_command(&self, executable: &Utf8Path) -> Vec<String> {
        vec![
            self.program.clone(),
            format!("--coverage={}", self.config.level),
            format!("--annotate={}", self.config.annotate),
            trace_path(executable.as_str()),
        ]
    }

    fn wrap(&self, command: Vec<String>) -> Vec<String> {
        let mut args = command.into_iter();
        let Some(executable) = args.next() else {
            return Vec::new();
        };

        let mut wrapped = vec![
            self.program.clone(),
            "--run".to_owned(),
            format!("--target={}", self.config.target),
            "-o".to_owned(),
            trace_path(&executable),
            executable,
        ];
        let rest: Vec<_> = args.collect();
        if !rest.is_empty() {
            wrapped.push("-eargs".to_owned());
            wrapped.extend(rest);
        }
        wrapped
    }
}

/// Returns the command line to execute for `command` (an executable followed by its arguments).
///
/// Without coverage, this is `command` itself. With coverage, the executable is run under the
/// coverage tool and its arguments are passed after `-eargs`.
pub fn build_run_invocation(command: Vec<String>, coverage: Option<&CoverageTool>) -> Vec<String> {
    match coverage {
        Some(tool) => tool.wrap(command),
        None => command,
    }
}

fn trace_path(executable: &str) -> String {
    format!("{executable}.trace")
}
