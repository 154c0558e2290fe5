// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared code for orbtest's integration tests and the fake ORB executables they drive.

pub mod helper_conf;
pub mod orbtest_cli;
