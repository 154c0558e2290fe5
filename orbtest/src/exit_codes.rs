// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use orbtest_runner::runner::TestOutcome;

/// Documented exit codes for `orbtest`.
///
/// The testsuite driver distinguishes a failed test from a test that produced no verdict at all,
/// and both from a scenario that couldn't be set up.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum OrbtestExitCode {}

impl OrbtestExitCode {
    /// The test passed.
    pub const OK: i32 = 0;

    /// The test ran and its output doesn't contain the success marker.
    pub const TEST_FAILED: i32 = 1;

    /// The scenario ran but no verdict could be derived, for example because the server died
    /// before printing its IOR.
    pub const NO_VERDICT: i32 = 2;

    /// A user issue happened while setting up the scenario: a missing executable or configuration
    /// file, or invalid settings.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// Returns the exit code for a scenario outcome.
    pub fn for_outcome(outcome: &TestOutcome) -> i32 {
        match outcome {
            TestOutcome::Passed => Self::OK,
            TestOutcome::Failed => Self::TEST_FAILED,
            TestOutcome::NoVerdict(_) => Self::NO_VERDICT,
        }
    }
}
