//! Startup options for the embedded JVM.
//!
//! The harness never interprets options; it only assembles them in a fixed
//! order (classpath, assertions, heap sizes, extras) and forwards them.

use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

static HEAP_SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[kKmMgG]?$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("invalid heap size {0:?}: expected digits with an optional k/m/g suffix")]
    HeapSize(String),
    #[error("classpath entry {0} cannot be joined: {1}")]
    Classpath(PathBuf, String),
}

/// Builder for the ordered option list passed to `JNI_CreateJavaVM`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupOptions {
    classpath: Vec<PathBuf>,
    enable_assertions: bool,
    initial_heap: Option<String>,
    max_heap: Option<String>,
    extra: Vec<String>,
}

impl StartupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classpath_entry(mut self, entry: impl AsRef<Path>) -> Self {
        self.classpath.push(entry.as_ref().to_path_buf());
        self
    }

    pub fn enable_assertions(mut self, enabled: bool) -> Self {
        self.enable_assertions = enabled;
        self
    }

    pub fn initial_heap(mut self, size: &str) -> Result<Self, OptionsError> {
        self.initial_heap = Some(validate_heap(size)?);
        Ok(self)
    }

    pub fn max_heap(mut self, size: &str) -> Result<Self, OptionsError> {
        self.max_heap = Some(validate_heap(size)?);
        Ok(self)
    }

    /// Appends an option that is passed through untouched.
    pub fn raw(mut self, option: impl Into<String>) -> Self {
        self.extra.push(option.into());
        self
    }

    /// Renders the option strings in their forwarding order.
    pub fn to_vec(&self) -> Result<Vec<String>, OptionsError> {
        let mut options = Vec::new();
        if !self.classpath.is_empty() {
            let joined = env::join_paths(&self.classpath).map_err(|err| {
                let offender = self
                    .classpath
                    .iter()
                    .find(|p| env::join_paths([p]).is_err())
                    .cloned()
                    .unwrap_or_default();
                OptionsError::Classpath(offender, err.to_string())
            })?;
            options.push(format!("-Djava.class.path={}", joined.to_string_lossy()));
        }
        if self.enable_assertions {
            options.push("-ea".to_string());
        }
        if let Some(size) = &self.initial_heap {
            options.push(format!("-Xms{}", size));
        }
        if let Some(size) = &self.max_heap {
            options.push(format!("-Xmx{}", size));
        }
        options.extend(self.extra.iter().cloned());
        Ok(options)
    }
}

fn validate_heap(size: &str) -> Result<String, OptionsError> {
    if HEAP_SIZE.is_match(size) {
        Ok(size.to_string())
    } else {
        Err(OptionsError::HeapSize(size.to_string()))
    }
}
