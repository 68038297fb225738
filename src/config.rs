//! Harness configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment overrides (`JT_JVM_PATH`, `JT_FIXTURES`), then command-line
//! flags (applied by the CLI).
//!
//! ```yaml
//! jvm_path: /usr/lib/jvm/java-17/lib/server/libjvm.so
//! fixtures_dir: tests/java
//! initial_heap: 16M
//! max_heap: 512M
//! enable_assertions: true
//! jvm_options: ["-Xss2M"]
//! omit: [fixtures]
//! ```

use crate::fixtures::FixtureClasspath;
use crate::locator::JvmLocator;
use crate::options::{OptionsError, StartupOptions};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_JVM_PATH: &str = "JT_JVM_PATH";
pub const ENV_FIXTURES: &str = "JT_FIXTURES";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    #[diagnostic(code(jt::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    #[diagnostic(code(jt::config::parse), help("valid keys: jvm_path, fixtures_dir, initial_heap, max_heap, enable_assertions, jvm_options, omit"))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    #[diagnostic(code(jt::config::options))]
    Options(#[from] OptionsError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// JVM library or Java home; skips discovery when set.
    pub jvm_path: Option<PathBuf>,
    /// Root of the fixtures; classes are read from `<fixtures_dir>/classes`.
    pub fixtures_dir: PathBuf,
    pub initial_heap: String,
    pub max_heap: String,
    pub enable_assertions: bool,
    /// Extra options appended verbatim after the standard ones.
    pub jvm_options: Vec<String>,
    /// Modules left out when no explicit module list is given.
    pub omit: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            jvm_path: None,
            fixtures_dir: PathBuf::from("tests/java"),
            initial_heap: "16M".to_string(),
            max_heap: "512M".to_string(),
            enable_assertions: true,
            jvm_options: Vec::new(),
            omit: Vec::new(),
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses YAML; an empty document gives the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Applies environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_JVM_PATH).filter(|v| !v.is_empty()) {
            log::debug!("{} overrides jvm_path", ENV_JVM_PATH);
            self.jvm_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup(ENV_FIXTURES).filter(|v| !v.is_empty()) {
            log::debug!("{} overrides fixtures_dir", ENV_FIXTURES);
            self.fixtures_dir = PathBuf::from(dir);
        }
    }

    /// The locator implied by this configuration.
    pub fn locator(&self) -> JvmLocator {
        let locator = JvmLocator::from_env();
        match &self.jvm_path {
            Some(path) => locator.with_explicit(path.clone()),
            None => locator,
        }
    }

    pub fn startup_options(&self, fixtures: &FixtureClasspath) -> Result<StartupOptions, ConfigError> {
        let mut options = StartupOptions::new()
            .classpath_entry(fixtures.classpath_dir())
            .enable_assertions(self.enable_assertions)
            .initial_heap(&self.initial_heap)?
            .max_heap(&self.max_heap)?;
        for option in &self.jvm_options {
            options = options.raw(option.clone());
        }
        Ok(options)
    }
}
