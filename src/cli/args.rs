//! Command-line arguments for `jt-test`.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use crate::config::HarnessConfig;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Runs the JVM bridge test suite against an embedded JVM.
#[derive(Debug, Parser)]
#[command(name = "jt-test", version, about = "Run the JVM bridge test suite in-process.")]
pub struct HarnessArgs {
    /// Modules or cases to run (`lifecycle`, `jt.statics.int_call`). Runs
    /// every module when omitted.
    #[arg(value_name = "MODULES")]
    pub modules: Vec<String>,

    /// Leave a module out of a full run. Ignored when MODULES are given.
    #[arg(long, value_name = "NAME")]
    pub omit: Vec<String>,

    /// JVM shared library or Java home to use instead of discovery.
    #[arg(long, value_name = "PATH")]
    pub jvm: Option<PathBuf>,

    /// Fixture root; compiled classes are read from `<DIR>/classes`.
    #[arg(long, value_name = "DIR")]
    pub fixtures: Option<PathBuf>,

    /// YAML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra JVM startup option, forwarded verbatim (repeatable).
    #[arg(long = "jvm-option", value_name = "OPT", allow_hyphen_values = true)]
    pub jvm_options: Vec<String>,

    /// List the available modules and cases, then exit.
    #[arg(long)]
    pub list: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// More log output (repeatable).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print failures and the summary.
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl HarnessArgs {
    /// Log filter implied by `-v`/`-q`; `RUST_LOG` still wins.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Applies flag overrides, the last configuration layer.
    pub fn apply_to(&self, config: &mut HarnessConfig) {
        if let Some(jvm) = &self.jvm {
            config.jvm_path = Some(jvm.clone());
        }
        if let Some(fixtures) = &self.fixtures {
            config.fixtures_dir = fixtures.clone();
        }
        config.jvm_options.extend(self.jvm_options.iter().cloned());
        config.omit.extend(self.omit.iter().cloned());
    }

    /// The explicit selection, if any.
    pub fn selection(&self) -> Option<&[String]> {
        (!self.modules.is_empty()).then_some(self.modules.as_slice())
    }
}
