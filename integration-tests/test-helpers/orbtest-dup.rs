// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A duplicate of orbtest's main.rs, so integration tests can run the CLI with
//! `CARGO_BIN_EXE_orbtest-dup`.

use color_eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = enable_ansi_support::enable_ansi_support();

    orbtest::main_impl()
}
