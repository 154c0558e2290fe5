// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction of IORs from server output.
//!
//! Servers announce themselves by printing a line containing `IOR:` followed by the stringified
//! object reference. The reference is lowercase alphanumeric and is terminated by a quote or a
//! line ending.

use crate::errors::MalformedIorLine;
use regex::Regex;
use std::{fmt, sync::LazyLock};

static IOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*(IOR:[a-z0-9]+)['\r\n]").unwrap());

/// The marker that identifies a line as an IOR announcement.
pub const IOR_MARKER: &str = "IOR:";

/// An IOR scraped from server output, passed to the client as its argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IorToken(String);

impl IorToken {
    fn new(raw: &str) -> Self {
        Self(
            raw.trim()
                .trim_matches(|c| c == '\'' || c == '"')
                .to_owned(),
        )
    }

    /// Returns the IOR as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IorToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Looks for an IOR in a complete line of server output, including its terminator.
///
/// Returns `Ok(None)` if the line doesn't mention an IOR, and an error if it does but the IOR is
/// malformed.
pub fn extract_ior(line: &str) -> Result<Option<IorToken>, MalformedIorLine> {
    if !line.contains(IOR_MARKER) {
        return Ok(None);
    }
    match IOR_REGEX.captures(line) {
        Some(captures) => Ok(Some(IorToken::new(&captures[1]))),
        None => Err(MalformedIorLine::new(line)),
    }
}

/// Assembles complete lines out of arbitrarily split chunks of output.
///
/// A line ends at the first `\n` or `\r`; the terminator is kept as part of the line.
#[derive(Debug, Default)]
pub struct LineAccumulator {
    partial: Vec<u8>,
}

impl LineAccumulator {
    /// Creates a new, empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of output, returning the lines completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            self.partial.push(byte);
            if byte == b'\n' || byte == b'\r' {
                lines.push(String::from_utf8_lossy(&self.partial).into_owned());
                self.partial.clear();
            }
        }
        lines
    }

    /// Returns whatever remains after the last line terminator, if anything.
    pub fn finish(self) -> Option<String> {
        (!self.partial.is_empty()).then(|| String::from_utf8_lossy(&self.partial).into_owned())
    }
}
