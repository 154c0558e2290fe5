// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests
//!
//! Each test lays out a throwaway testsuite (source, build and log directories) in a temporary
//! directory, installs the fake ORB executables from `test-helpers/` under the names the test
//! needs, and runs scenarios against them, either through `TestRunner` directly or through the
//! `orbtest-dup` binary.

mod client_server;
mod fixtures;
mod local;
