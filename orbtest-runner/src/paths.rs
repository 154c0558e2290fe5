// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of executables, configuration files and tools.

use crate::{
    errors::{ConfigNotFound, ExecutableNotFound, ToolNotFound},
    settings::SuiteSettings,
};
use camino::{Utf8Path, Utf8PathBuf};

/// The platform's executable suffix, e.g. `.exe` on Windows and empty elsewhere.
pub const EXE_SUFFIX: &str = std::env::consts::EXE_SUFFIX;

/// Appends [`EXE_SUFFIX`] to `exe_name` unless it already ends with it, ignoring case.
pub fn add_extension(exe_name: &str) -> String {
    add_suffix(exe_name, EXE_SUFFIX)
}

fn add_suffix(exe_name: &str, suffix: &str) -> String {
    if exe_name.to_lowercase().ends_with(&suffix.to_lowercase()) {
        exe_name.to_owned()
    } else {
        format!("{exe_name}{suffix}")
    }
}

/// Resolves a test executable relative to the testsuite build directory.
pub fn resolve_executable(
    settings: &SuiteSettings,
    command: &str,
) -> Result<Utf8PathBuf, ExecutableNotFound> {
    let path = Utf8PathBuf::from(add_extension(settings.base_dir().join(command).as_str()));
    if path.exists() {
        Ok(path)
    } else {
        Err(ExecutableNotFound::new(path))
    }
}

/// Resolves a configuration file name.
///
/// Absolute paths must exist. Relative names are looked up in the shared configuration directory,
/// then in the test's own source directory.
pub fn resolve_conf_path(
    settings: &SuiteSettings,
    conf_name: &str,
) -> Result<Utf8PathBuf, ConfigNotFound> {
    let conf_path = Utf8Path::new(conf_name);
    if conf_path.is_absolute() {
        return if conf_path.exists() {
            Ok(conf_path.to_owned())
        } else {
            Err(ConfigNotFound::new(conf_name, vec![conf_path.to_owned()]))
        };
    }

    let searched: Vec<_> = [settings.conf_dir(), settings.test_src_dir()]
        .into_iter()
        .map(|dir| dir.join(conf_path))
        .collect();
    match searched.iter().find(|candidate| candidate.exists()) {
        Some(found) => Ok(found.clone()),
        None => Err(ConfigNotFound::new(conf_name, searched)),
    }
}

/// Returns `tool_dir/tool_name`, unless the suite runs against an installed product, in which case
/// the tool is located on `PATH`.
pub fn tool_path(
    use_installed: bool,
    tool_dir: &Utf8Path,
    tool_name: &str,
) -> Result<Utf8PathBuf, ToolNotFound> {
    if use_installed {
        find_on_path(tool_name)
    } else {
        Ok(tool_dir.join(tool_name))
    }
}

/// Locates an executable on `PATH`.
pub fn find_on_path(tool_name: &str) -> Result<Utf8PathBuf, ToolNotFound> {
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&path_var)
        .filter_map(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .map(|dir| dir.join(add_extension(tool_name)))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ToolNotFound::new(tool_name))
}
