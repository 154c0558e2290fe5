// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A fake ORB client, also used as a local test.
//!
//! Prints its configuration file and arguments, then a verdict. Keys:
//!
//! - `expect-ior`: fail unless the first argument is this IOR
//! - `sleep-ms`: sleep before printing the verdict
//! - `verdict`: `passed` (default), `failed` or `none`
//! - `exit`: exit with this code

use color_eyre::{
    Result,
    eyre::{Context, bail},
};
use integration_tests::helper_conf::HelperConf;
use std::{thread, time::Duration};

fn main() -> Result<()> {
    color_eyre::install()?;
    let conf = HelperConf::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    println!(
        "conf = {}",
        conf.path().map_or("none", |path| path.as_str())
    );
    println!("args = {}", shell_words::join(&args));
    eprintln!("client stderr");

    let mut verdict = conf.get("verdict").unwrap_or("passed");
    if let Some(expected) = conf
        .get("expect-ior")
        .filter(|expected| args.first().map(String::as_str) != Some(*expected))
    {
        println!("unexpected IOR, expected {expected}");
        verdict = "failed";
    }

    if let Some(sleep) = conf.get_u64("sleep-ms")? {
        thread::sleep(Duration::from_millis(sleep));
    }

    match verdict {
        "passed" => println!("...END TESTS................   PASSED"),
        "failed" => println!("END TESTS................   FAILED"),
        "none" => {}
        other => bail!("unknown verdict {other:?}"),
    }

    if let Some(code) = conf.get("exit") {
        let code: i32 = code.parse().wrap_err("`exit` must be an integer")?;
        std::process::exit(code);
    }
    Ok(())
}
