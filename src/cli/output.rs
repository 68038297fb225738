//! Handles all user-facing output for the CLI.
//!
//! Progress and failure details go to stderr in the style of a verbose text
//! test runner; the JSON report and `--list` go to stdout.

use super::args::OutputFormat;
use crate::suite::runner::{CaseRecord, Outcome, Reporter, TestSummary};
use crate::suite::SuiteRegistry;
use difference::{Changeset, Difference};
use std::io::{self, Write};
use std::time::Duration;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const HEAVY_RULE: &str = "======================================================================";
const LIGHT_RULE: &str = "----------------------------------------------------------------------";

// ============================================================================
// COLOR
// ============================================================================

/// Colors only when stderr is a terminal and the user did not opt out.
pub fn color_choice(no_color: bool) -> ColorChoice {
    if !no_color && atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn outcome_color(outcome: &Outcome) -> Color {
    match outcome {
        Outcome::Passed => Color::Green,
        Outcome::Failed(_) | Outcome::Errored(_) => Color::Red,
        Outcome::Skipped(_) => Color::Yellow,
    }
}

fn write_colored(out: &mut StandardStream, text: &str, color: Color, bold: bool) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
    write!(out, "{}", text)?;
    out.reset()
}

// ============================================================================
// PROGRESS REPORTING
// ============================================================================

/// One line per case: `name (module) ... ok`.
pub struct TextReporter {
    out: StandardStream,
    quiet: bool,
}

impl TextReporter {
    pub fn new(color: ColorChoice, quiet: bool) -> Self {
        Self {
            out: StandardStream::stderr(color),
            quiet,
        }
    }
}

impl Reporter for TextReporter {
    fn case_started(&mut self, module: &str, case: &str) {
        if !self.quiet {
            let _ = write!(self.out, "{} ({}) ... ", case, module);
            let _ = self.out.flush();
        }
    }

    fn case_finished(&mut self, record: &CaseRecord) {
        if self.quiet {
            if !record.outcome.is_problem() {
                return;
            }
            let _ = write!(self.out, "{} ({}) ... ", record.name, record.module);
        }
        let label = record.outcome.label();
        let _ = write_colored(&mut self.out, label, outcome_color(&record.outcome), false);
        match &record.outcome {
            Outcome::Skipped(reason) => {
                let _ = writeln!(self.out, " {:?}", reason);
            }
            _ => {
                let _ = writeln!(self.out);
            }
        }
    }
}

/// Progress reporter for `format`; JSON reports only at the end.
pub fn reporter(format: OutputFormat, color: ColorChoice, quiet: bool) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Text => Box::new(TextReporter::new(color, quiet)),
        OutputFormat::Json => Box::new(crate::suite::runner::SilentReporter),
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

pub fn print_summary(
    summary: &TestSummary,
    format: OutputFormat,
    color: ColorChoice,
    elapsed: Duration,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
            println!("{}", json);
            Ok(())
        }
        OutputFormat::Text => {
            let mut err = StandardStream::stderr(color);
            print_text_summary(&mut err, summary, elapsed)
        }
    }
}

fn print_text_summary(out: &mut StandardStream, summary: &TestSummary, elapsed: Duration) -> io::Result<()> {
    for record in summary.problems() {
        writeln!(out)?;
        writeln!(out, "{}", HEAVY_RULE)?;
        write_colored(out, record.outcome.label(), Color::Red, true)?;
        writeln!(out, ": {} ({})", record.name, record.module)?;
        writeln!(out, "{}", LIGHT_RULE)?;
        let detail = record.outcome.detail().unwrap_or_default();
        writeln!(out, "{}", detail)?;
        if let Some((left, right)) = split_comparison(detail) {
            writeln!(out, "diff:")?;
            print_diff(out, &Changeset::new(left, right, " ").diffs)?;
        }
    }

    writeln!(out, "{}", LIGHT_RULE)?;
    writeln!(out, "Ran {} test(s) in {:.3}s", summary.total(), elapsed.as_secs_f64())?;
    writeln!(out)?;
    if summary.was_successful() {
        write_colored(out, "OK", Color::Green, true)?;
        if summary.skipped > 0 {
            write!(out, " (skipped={})", summary.skipped)?;
        }
    } else {
        write_colored(out, "FAILED", Color::Red, true)?;
        write!(out, " ({})", failure_counts(summary))?;
    }
    writeln!(out)
}

fn failure_counts(summary: &TestSummary) -> String {
    let mut parts = Vec::new();
    if summary.failed > 0 {
        parts.push(format!("failures={}", summary.failed));
    }
    if summary.errored > 0 {
        parts.push(format!("errors={}", summary.errored));
    }
    if summary.skipped > 0 {
        parts.push(format!("skipped={}", summary.skipped));
    }
    parts.join(", ")
}

/// Pulls the two sides out of a `check_eq!` failure message.
fn split_comparison(detail: &str) -> Option<(&str, &str)> {
    let left = detail
        .lines()
        .find_map(|l| l.trim_start().strip_prefix("left: "))?;
    let right = detail
        .lines()
        .find_map(|l| l.trim_start().strip_prefix("right: "))?;
    Some((left, right))
}

fn print_diff(out: &mut StandardStream, diffs: &[Difference]) -> io::Result<()> {
    for diff in diffs {
        match diff {
            Difference::Same(x) => {
                out.reset()?;
                writeln!(out, "  {}", x)?;
            }
            Difference::Add(x) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                writeln!(out, "+ {}", x)?;
            }
            Difference::Rem(x) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                writeln!(out, "- {}", x)?;
            }
        }
    }
    out.reset()
}

// ============================================================================
// LISTING
// ============================================================================

pub fn print_listing(registry: &SuiteRegistry) {
    for module in registry.modules() {
        println!("{}.{}  {}", crate::suite::PACKAGE, module.name, module.description);
        for case in &module.cases {
            println!("    {}.{}", module.name, case.name);
        }
    }
}
