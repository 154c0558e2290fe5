// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Verdicts derived from captured output.
//!
//! Test executables report success by printing `END TESTS` followed, possibly several lines
//! later, by `PASSED`.

use camino::Utf8Path;
use regex::bytes::Regex;
use std::{fmt, io, sync::LazyLock};

static VERDICT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s-u)END TESTS.*PASSED").unwrap());

/// The verdict for a test whose output was captured.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The success marker was found.
    Passed,

    /// The output exists but the success marker wasn't found.
    Failed,
}

impl Verdict {
    /// Returns true if the verdict is [`Verdict::Passed`].
    pub fn is_success(self) -> bool {
        self == Verdict::Passed
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::Passed => f.write_str("PASSED"),
            Verdict::Failed => f.write_str("FAILED"),
        }
    }
}

/// Scans captured output for the success marker.
pub fn scan_output(output: &[u8]) -> Verdict {
    if VERDICT_REGEX.is_match(output) {
        Verdict::Passed
    } else {
        Verdict::Failed
    }
}

/// Reads a capture file and derives a verdict from it.
///
/// Returns `Ok(None)` if the file doesn't exist: the executable never ran, which is distinct from
/// a failure.
pub fn check_output(test_name: &str, output_file: &Utf8Path) -> io::Result<Option<Verdict>> {
    let output = match std::fs::read(output_file) {
        Ok(output) => output,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("no output captured at {output_file}");
            return Ok(None);
        }
        Err(error) => return Err(error),
    };

    tracing::debug!(
        "captured output from {output_file}:\n{}",
        String::from_utf8_lossy(&output)
    );

    let verdict = scan_output(&output);
    tracing::info!("{test_name} {verdict}");
    Ok(Some(verdict))
}
