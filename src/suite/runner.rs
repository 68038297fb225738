//! Sequential execution of a [`TestSuite`].
//!
//! Cases run one after another on the calling thread, which is the thread
//! that started the runtime. A panicking case is recorded as an error and
//! does not stop the run.

use super::{CaseError, SuiteEntry, TestContext, TestSuite};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

// =============================================================================
// CORE TYPES
// =============================================================================

/// How a single case ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    /// An assertion did not hold.
    Failed(String),
    /// The case hit an unexpected bridge error or panicked.
    Errored(String),
    Skipped(String),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "ok",
            Outcome::Failed(_) => "FAIL",
            Outcome::Errored(_) => "ERROR",
            Outcome::Skipped(_) => "skipped",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed(d) | Outcome::Errored(d) | Outcome::Skipped(d) => Some(d),
        }
    }

    pub fn is_problem(&self) -> bool {
        matches!(self, Outcome::Failed(_) | Outcome::Errored(_))
    }
}

impl From<CaseError> for Outcome {
    fn from(err: CaseError) -> Self {
        match err {
            CaseError::Failed(message) => Outcome::Failed(message),
            CaseError::Skipped(reason) => Outcome::Skipped(reason),
            CaseError::Bridge(err) => Outcome::Errored(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    pub module: String,
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_ms: f64,
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub records: Vec<CaseRecord>,
}

impl TestSummary {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// True when nothing failed or errored. Skips do not count against it.
    pub fn was_successful(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    pub fn problems(&self) -> impl Iterator<Item = &CaseRecord> {
        self.records.iter().filter(|r| r.outcome.is_problem())
    }

    fn push(&mut self, record: CaseRecord) {
        match record.outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed(_) => self.failed += 1,
            Outcome::Errored(_) => self.errored += 1,
            Outcome::Skipped(_) => self.skipped += 1,
        }
        self.records.push(record);
    }
}

// =============================================================================
// REPORTING HOOK
// =============================================================================

/// Receives progress while a suite runs.
pub trait Reporter {
    fn case_started(&mut self, _module: &str, _case: &str) {}
    fn case_finished(&mut self, record: &CaseRecord);
}

/// Reports nothing.
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn case_finished(&mut self, _record: &CaseRecord) {}
}

// =============================================================================
// EXECUTION
// =============================================================================

pub fn run_suite(suite: &TestSuite, ctx: &TestContext<'_>, reporter: &mut dyn Reporter) -> TestSummary {
    let mut summary = TestSummary::default();
    log::info!("running {} case(s)", suite.len());
    for entry in suite.entries() {
        reporter.case_started(entry.module, entry.case.name);
        let record = run_case(entry, ctx);
        log::debug!(
            "{}.{} -> {} ({:.1} ms)",
            record.module,
            record.name,
            record.outcome.label(),
            record.duration_ms
        );
        reporter.case_finished(&record);
        summary.push(record);
    }
    summary
}

pub fn run_case(entry: &SuiteEntry, ctx: &TestContext<'_>) -> CaseRecord {
    let started = Instant::now();
    let run = entry.case.run;
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| run(ctx))) {
        Ok(Ok(())) => Outcome::Passed,
        Ok(Err(err)) => Outcome::from(err),
        Err(payload) => Outcome::Errored(format!("case panicked: {}", panic_message(&*payload))),
    };
    CaseRecord {
        module: entry.module.to_string(),
        name: entry.case.name.to_string(),
        outcome,
        duration_ms: started.elapsed().as_secs_f64() * 1000.0,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
