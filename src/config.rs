//! Configuration loader
//!
//! `defaults/cute.default.toml` is embedded into the crate so that docs and runtime
//! behavior stay in sync. Callers layer user-specific files and single-key overrides
//! on top of those defaults via [`Loader`] before deserializing into [`CuteConfig`].
//!
//! The command-line tool layers, in order: the defaults, a `cute.toml` in the working
//! directory if present, the file given with `--config`, then flag overrides.

use crate::rewriting::RewriteOptions;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/cute.default.toml");

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = "cute.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct CuteConfig {
    pub rewrite: RewriteConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewriteConfig {
    pub max_reductions: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub escape_newlines: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&RewriteConfig> for RewriteOptions {
    fn from(config: &RewriteConfig) -> Self {
        RewriteOptions {
            max_reductions: config.max_reductions,
        }
    }
}

/// Layers user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `dir/cute.toml` if it exists.
    pub fn with_directory(self, dir: impl AsRef<Path>) -> Self {
        self.with_optional_file(dir.as_ref().join(LOCAL_CONFIG_FILE))
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. `("rewrite.max_reductions", 10)`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<CuteConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
