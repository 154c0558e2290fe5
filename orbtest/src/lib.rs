// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line driver for the ORB testsuite.
//!
//! Each invocation runs one scenario for one test, reading the testsuite's environment (`RLIMIT`,
//! `TEST_NAME`, `SRC_DIR`, `BUILD_DIR`, `LOG_DIR`, `COVERAGE`, `VERBOSE`) unless overridden on the
//! command line. The outcome is reported through the exit code; see [`OrbtestExitCode`].

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::OrbtestExitCode;

/// Parses the command line, runs the requested command and exits with its exit code.
#[doc(hidden)]
pub fn main_impl() -> color_eyre::Result<()> {
    use clap::Parser;

    let app = OrbtestApp::parse();
    let output = app.init_output();

    match app.exec() {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr(&output.stderr_styles());
            std::process::exit(error.process_exit_code())
        }
    }
}
