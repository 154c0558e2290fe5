// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-child environment maps.
//!
//! orbtest never mutates its own environment. Variables meant for a test executable (most
//! importantly the configuration file variable) are collected in an [`EnvironmentMap`] and applied
//! to that child's command only.

use std::{collections::BTreeMap, fmt, process::Command};

/// Environment variables to set on a single child process, on top of the inherited environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvironmentMap {
    map: BTreeMap<String, String>,
}

impl EnvironmentMap {
    /// Creates an empty `EnvironmentMap`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a map that passes a configuration file through `conf_env_var`, if one is given.
    pub fn with_conf(conf_env_var: &str, conf_path: Option<&str>) -> Self {
        let mut env = Self::empty();
        if let Some(conf_path) = conf_path {
            env.insert(conf_env_var, conf_path);
        }
        env
    }

    /// Sets a variable, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.map.insert(name.into(), value.into());
        self
    }

    /// Returns the value of a variable, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    /// Returns true if no variables are set.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn apply_env(&self, command: &mut Command) {
        for (name, value) in &self.map {
            command.env(name, value);
        }
    }
}

/// Displays the map as a `NAME=value` prefix for logged command lines.
impl fmt::Display for EnvironmentMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (name, value) in &self.map {
            write!(f, "{name}={} ", shell_words::quote(value))?;
        }
        Ok(())
    }
}
