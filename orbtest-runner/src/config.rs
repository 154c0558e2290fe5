// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suite configuration.
//!
//! The configuration is assembled from three layers, lowest precedence first: the defaults built
//! into orbtest, the `tests/config.toml` file written by the testsuite's configure step, and an
//! explicitly requested file.

use crate::errors::SuiteConfigError;
use camino::Utf8Path;
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::time::Duration;

/// Configuration shared by every scenario in a testsuite run.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SuiteConfig {
    use_installed: bool,
    conf_env_var: String,
    server: ServerConfig,
    coverage: CoverageConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ServerConfig {
    #[serde(with = "humantime_serde")]
    grace_period: Duration,
}

/// Settings for the coverage tool.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CoverageConfig {
    /// The name of the coverage tool.
    pub tool: String,

    /// The target passed to the tool while collecting traces.
    pub target: String,

    /// The coverage level used for reports.
    pub level: String,

    /// The annotation format used for reports.
    pub annotate: String,
}

impl SuiteConfig {
    /// The location of the configure-generated config, relative to the testsuite build directory.
    pub const CONFIG_PATH: &'static str = "tests/config.toml";

    /// Contains the default config as a TOML file.
    ///
    /// ```toml
    #[doc = include_str!("../default-config.toml")]
    /// ```
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the suite config.
    ///
    /// `base_dir` is the testsuite build directory. If `config_file` is specified, it must exist;
    /// `base_dir/tests/config.toml` is read if present.
    pub fn from_sources(
        base_dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, SuiteConfigError> {
        let generated = base_dir.join(Self::CONFIG_PATH);
        let mut builder = Self::make_default_config()
            .add_source(File::new(generated.as_str(), FileFormat::Toml).required(false));
        if let Some(file) = config_file {
            builder = builder.add_source(File::new(file.as_str(), FileFormat::Toml));
        }

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|err| SuiteConfigError::new(config_file.map(|f| f.to_owned()), err))
    }

    /// Returns the built-in defaults with no files layered on top.
    pub fn default_config() -> Self {
        Self::make_default_config()
            .build()
            .and_then(|config| config.try_deserialize())
            .expect("default config is always valid")
    }

    /// Returns true if tools should be located on `PATH`.
    pub fn use_installed(&self) -> bool {
        self.use_installed
    }

    /// Returns the environment variable through which configuration files are passed to children.
    pub fn conf_env_var(&self) -> &str {
        &self.conf_env_var
    }

    /// Returns how long a server is given to exit after being asked to terminate.
    pub fn server_grace_period(&self) -> Duration {
        self.server.grace_period
    }

    /// Returns the coverage tool settings.
    pub fn coverage(&self) -> &CoverageConfig {
        &self.coverage
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }
}
