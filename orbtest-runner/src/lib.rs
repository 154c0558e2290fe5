// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for orbtest, the ORB testsuite driver.
//!
//! A test scenario is either *local* (a single executable) or *client-server*: the server is
//! started first, its IOR is scraped from its standard output, and the client is then run with
//! the IOR as its argument. In both cases the verdict is derived from the captured output of the
//! last executable run. See [`runner::TestRunner`] for the entry points.

pub mod config;
pub mod coverage;
pub mod env;
pub mod errors;
pub mod ior;
pub mod paths;
mod process;
pub mod runner;
pub mod settings;
pub mod verdict;
