// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A fake coverage tool.
//!
//! With `--run --target=<target> -o <trace> <exe> [-eargs <args>...]`, it writes a trace file
//! recording the invocation, then runs the executable in its place. With
//! `--coverage=<level> --annotate=<format> <trace>`, it prints a report for an existing trace.

use color_eyre::{
    Result,
    eyre::{bail, eyre},
};
use fs_err as fs;
use std::process::Command;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("--run") => run(&args[1..]),
        Some(_) => report(&args),
        None => bail!("no arguments"),
    }
}

fn run(args: &[String]) -> Result<()> {
    let [target, dash_o, trace, exe, rest @ ..] = args else {
        bail!("expected --target=<target> -o <trace> <exe>, found {args:?}");
    };
    let target = target
        .strip_prefix("--target=")
        .ok_or_else(|| eyre!("expected --target, found {target}"))?;
    if dash_o != "-o" {
        bail!("expected -o, found {dash_o}");
    }
    let exe_args = match rest {
        [] => &[][..],
        [eargs, exe_args @ ..] if eargs == "-eargs" => exe_args,
        other => bail!("expected -eargs, found {other:?}"),
    };

    fs::write(
        trace,
        format!(
            "target = {target}\nexe = {exe}\nargs = {}\n",
            shell_words::join(exe_args)
        ),
    )?;

    let mut command = Command::new(exe);
    command.args(exe_args);
    exec(command)
}

#[cfg(unix)]
fn exec(mut command: Command) -> Result<()> {
    use std::os::unix::process::CommandExt;

    // Replace this process so that signals sent to it reach the executable.
    Err(command.exec().into())
}

#[cfg(not(unix))]
fn exec(mut command: Command) -> Result<()> {
    let status = command.status()?;
    std::process::exit(status.code().unwrap_or(1));
}

fn report(args: &[String]) -> Result<()> {
    let [coverage, annotate, trace] = args else {
        bail!("expected --coverage=<level> --annotate=<format> <trace>, found {args:?}");
    };
    let level = coverage
        .strip_prefix("--coverage=")
        .ok_or_else(|| eyre!("expected --coverage, found {coverage}"))?;
    let format = annotate
        .strip_prefix("--annotate=")
        .ok_or_else(|| eyre!("expected --annotate, found {annotate}"))?;

    let contents = fs::read_to_string(trace)?;
    println!("coverage = {level}, annotate = {format}");
    print!("{contents}");
    Ok(())
}
