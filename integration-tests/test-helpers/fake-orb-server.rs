// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A fake ORB server.
//!
//! Prints its pid and configuration file, then whatever its configuration asks for, then stays up
//! until it's killed. Keys:
//!
//! - `delay-ms`: sleep before printing anything else
//! - `line`: a line to print (repeatable)
//! - `split-line`: a line to print one byte at a time
//! - `exit`: exit with this code instead of staying up
//! - `linger-secs`: how long to stay up (default 120)
//!
//! Without a configuration file, it prints a well-formed IOR.

use color_eyre::{Result, eyre::Context};
use integration_tests::helper_conf::HelperConf;
use std::{
    io::{self, Write},
    thread,
    time::{Duration, Instant},
};

const DEFAULT_IOR: &str = "IOR:010000002000000049444c3a6f6d672e6f72672f434f5242412f4f626a6563743a312e30";

fn main() -> Result<()> {
    color_eyre::install()?;
    let conf = HelperConf::from_env()?;
    let mut stdout = io::stdout().lock();

    writeln!(stdout, "pid = {}", std::process::id())?;
    writeln!(
        stdout,
        "conf = {}",
        conf.path().map_or("none", |path| path.as_str())
    )?;
    stdout.flush()?;

    if let Some(delay) = conf.get_u64("delay-ms")? {
        thread::sleep(Duration::from_millis(delay));
    }

    if conf.path().is_none() {
        writeln!(stdout, "'{DEFAULT_IOR}'")?;
    }
    for line in conf.get_all("line") {
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
    }
    if let Some(line) = conf.get("split-line") {
        for byte in line.bytes().chain(*b"\n") {
            stdout.write_all(&[byte])?;
            stdout.flush()?;
            thread::sleep(Duration::from_millis(2));
        }
    }
    stdout.flush()?;

    if let Some(code) = conf.get("exit") {
        let code: i32 = code.parse().wrap_err("`exit` must be an integer")?;
        std::process::exit(code);
    }

    let linger = Duration::from_secs(conf.get_u64("linger-secs")?.unwrap_or(120));
    let deadline = Instant::now() + linger;
    while Instant::now() < deadline {
        thread::sleep(Duration::from_millis(100));
    }
    Ok(())
}
