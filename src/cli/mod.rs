//! The `jt-test` command-line interface.
//!
//! Orchestrates one run: configuration layering, suite selection, JVM
//! location, a scoped runtime, and reporting. Selection happens before the
//! JVM is located or started, so a bad module name never touches native code.

use crate::cli::args::HarnessArgs;
use crate::config::{ConfigError, HarnessConfig};
use crate::fixtures::FixtureClasspath;
use crate::mapping::ErrorMap;
use crate::runtime::jni::JniBackend;
use crate::runtime::Runtime;
use crate::suite::runner::{self, TestSummary};
use crate::suite::{SuiteRegistry, TestContext};
use clap::Parser;
use std::time::Instant;

pub mod args;
pub mod output;

/// Parses the process arguments and runs; returns the exit code.
pub fn run() -> i32 {
    run_with(HarnessArgs::parse())
}

pub fn run_with(args: HarnessArgs) -> i32 {
    init_logging(args.log_filter());
    match execute(&args) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(report) => {
            eprintln!("{:?}", report);
            1
        }
    }
}

fn init_logging(default_filter: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

/// Layers file, environment, and flags, in that order.
fn load_config(args: &HarnessArgs) -> Result<HarnessConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok());
    args.apply_to(&mut config);
    Ok(config)
}

/// `Ok(true)` when every selected case passed (or skipped) and the runtime
/// shut down cleanly.
fn execute(args: &HarnessArgs) -> miette::Result<bool> {
    let config = load_config(args)?;
    let registry = SuiteRegistry::builtin();

    if args.list {
        output::print_listing(&registry);
        return Ok(true);
    }

    let suite = registry.select(args.selection(), &config.omit)?;
    let fixtures = FixtureClasspath::resolve(&config.fixtures_dir);
    let options = config
        .startup_options(&fixtures)?
        .to_vec()
        .map_err(ConfigError::from)?;
    let jvm_path = config.locator().locate()?;

    eprintln!("Running testsuite using JVM: {}\n", jvm_path.display());

    let color = output::color_choice(args.no_color);
    let mut reporter = output::reporter(args.format, color, args.quiet);
    let runtime = Runtime::new(JniBackend::new(&jvm_path), ErrorMap::standard());
    let started = Instant::now();

    let scoped = runtime.run_scoped(options, |rt| -> TestSummary {
        let ctx = TestContext {
            runtime: rt,
            fixtures: &fixtures,
        };
        runner::run_suite(&suite, &ctx, reporter.as_mut())
    })?;

    let summary = scoped.value;
    if let Err(err) = output::print_summary(&summary, args.format, color, started.elapsed()) {
        log::warn!("could not write the report: {}", err);
    }
    let shut_down = match scoped.shutdown {
        Ok(()) => true,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            false
        }
    };
    Ok(summary.was_successful() && shut_down)
}
