// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the fake ORB executables.
//!
//! The fakes read the file named by `POLYORB_CONF`, the same way real test executables do. Each
//! non-empty line that doesn't start with `#` is a `key = value` pair; keys may repeat.

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::{
    Result,
    eyre::{Context, bail},
};
use fs_err as fs;

/// Parsed settings for a fake executable.
#[derive(Clone, Debug, Default)]
pub struct HelperConf {
    path: Option<Utf8PathBuf>,
    entries: Vec<(String, String)>,
}

impl HelperConf {
    /// The variable naming the configuration file.
    pub const ENV_VAR: &'static str = "POLYORB_CONF";

    /// Reads the configuration named by [`Self::ENV_VAR`], or returns an empty one if it isn't set.
    pub fn from_env() -> Result<Self> {
        match std::env::var(Self::ENV_VAR) {
            Ok(path) => Self::read(path),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(err) => Err(err).wrap_err_with(|| format!("invalid {}", Self::ENV_VAR)),
        }
    }

    /// Reads a configuration file.
    pub fn read(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path)?;
        let mut conf = Self::parse(&contents).wrap_err_with(|| format!("in {path}"))?;
        conf.path = Some(path);
        Ok(conf)
    }

    /// Parses the contents of a configuration file.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                bail!("line {}: expected `key = value`, found {line:?}", idx + 1);
            };
            entries.push((key.trim().to_owned(), value.trim().to_owned()));
        }
        Ok(Self {
            path: None,
            entries,
        })
    }

    /// Returns the file this configuration was read from, if any.
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Returns the last value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).last()
    }

    /// Returns every value for `key`, in file order.
    pub fn get_all<'a, 'k>(&'a self, key: &'k str) -> impl Iterator<Item = &'a str> + use<'a, 'k> {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the last value for `key`, parsed as an integer.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        self.get(key)
            .map(|value| {
                value
                    .parse()
                    .wrap_err_with(|| format!("`{key}` must be an integer, found {value:?}"))
            })
            .transpose()
    }
}
