//! Test orchestration: registering test modules, selecting the ones to run,
//! and the assertion helpers their cases use.
//!
//! # Architecture
//!
//! 1. **Registration**: a [`SuiteRegistry`] holds named [`TestModule`]s, each a
//!    list of [`TestCase`] functions.
//! 2. **Selection**: [`SuiteRegistry::select`] turns an optional list of names
//!    into a flat [`TestSuite`]. With no names, every module except the
//!    omitted ones is selected. Unknown names fail here, before the runtime
//!    is touched.
//! 3. **Execution**: [`runner::run_suite`] runs the cases sequentially against
//!    one [`TestContext`] and produces a [`runner::TestSummary`].
//!
//! # Names
//!
//! A name is `module` or `module.case`, optionally qualified with the
//! package prefix: `lifecycle`, `jt.lifecycle`, `jt.statics.math_abs`.

pub mod modules;
pub mod runner;

use crate::errors::{BridgeError, BridgeResult};
use crate::fixtures::FixtureClasspath;
use crate::runtime::Runtime;
use crate::status::ErrorKind;
use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// Package prefix accepted in front of module names.
pub const PACKAGE: &str = "jt";

// =============================================================================
// CORE TYPES
// =============================================================================

/// Everything a case can use: the running JVM and the fixture index.
#[derive(Clone, Copy)]
pub struct TestContext<'a> {
    pub runtime: &'a Runtime,
    pub fixtures: &'a FixtureClasspath,
}

/// Why a case did not pass.
#[derive(Debug)]
pub enum CaseError {
    /// An assertion did not hold.
    Failed(String),
    /// The case could not run here (e.g. its fixture class is missing).
    Skipped(String),
    /// A bridge error nobody expected.
    Bridge(BridgeError),
}

impl From<BridgeError> for CaseError {
    fn from(err: BridgeError) -> Self {
        CaseError::Bridge(err)
    }
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseError::Failed(message) => f.write_str(message),
            CaseError::Skipped(reason) => write!(f, "skipped: {}", reason),
            CaseError::Bridge(err) => write!(f, "{}", err),
        }
    }
}

pub type CaseResult = Result<(), CaseError>;
pub type CaseFn = fn(&TestContext<'_>) -> CaseResult;

#[derive(Clone, Copy)]
pub struct TestCase {
    pub name: &'static str,
    pub run: CaseFn,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub struct TestModule {
    pub name: &'static str,
    pub description: &'static str,
    pub cases: Vec<TestCase>,
}

impl TestModule {
    pub fn case(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.name == name)
    }
}

/// One selected case, tagged with its module.
#[derive(Debug, Clone, Copy)]
pub struct SuiteEntry {
    pub module: &'static str,
    pub case: TestCase,
}

/// The aggregate collection of cases to run, in order.
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    entries: Vec<SuiteEntry>,
}

impl TestSuite {
    pub fn entries(&self) -> &[SuiteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// SELECTION ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SuiteError {
    #[error("no test module named '{name}'")]
    #[diagnostic(code(jt::suite::unknown_module), help("available modules: {}", available.join(", ")))]
    UnknownModule { name: String, available: Vec<String> },

    #[error("test module '{module}' has no case named '{case}'")]
    #[diagnostic(code(jt::suite::unknown_case))]
    UnknownCase { module: String, case: String },

    #[error("test module '{0}' is registered twice")]
    #[diagnostic(code(jt::suite::duplicate_module))]
    DuplicateModule(String),
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct SuiteRegistry {
    modules: Vec<TestModule>,
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The modules shipped with the harness.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for module in modules::all() {
            // built-in names are distinct
            let _ = registry.register(module);
        }
        registry
    }

    pub fn register(&mut self, module: TestModule) -> Result<(), SuiteError> {
        if self.get(module.name).is_some() {
            return Err(SuiteError::DuplicateModule(module.name.to_string()));
        }
        self.modules.push(module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TestModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn modules(&self) -> &[TestModule] {
        &self.modules
    }

    /// Registered module names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name).collect()
    }

    /// Builds the suite to run.
    ///
    /// With `names == None`, every module not in `omit` is selected, in
    /// registration order. Otherwise exactly the named modules/cases are
    /// selected in the given order and `omit` is ignored.
    ///
    /// # Errors
    /// [`SuiteError::UnknownModule`] or [`SuiteError::UnknownCase`] naming
    /// the first name that does not resolve.
    pub fn select(&self, names: Option<&[String]>, omit: &[String]) -> Result<TestSuite, SuiteError> {
        let mut entries = Vec::new();
        match names {
            None => {
                let omitted: Vec<&str> = omit.iter().map(|n| unqualified(n)).collect();
                for module in &self.modules {
                    if omitted.contains(&module.name) {
                        log::debug!("omitting module {}", module.name);
                        continue;
                    }
                    entries.extend(module.cases.iter().map(|case| SuiteEntry {
                        module: module.name,
                        case: *case,
                    }));
                }
            }
            Some(names) => {
                for name in names {
                    entries.extend(self.resolve_name(name)?);
                }
            }
        }
        Ok(TestSuite { entries })
    }

    fn resolve_name(&self, name: &str) -> Result<Vec<SuiteEntry>, SuiteError> {
        let bare = unqualified(name);
        let (module_name, case_name) = match bare.split_once('.') {
            Some((module, case)) => (module, Some(case)),
            None => (bare, None),
        };
        let module = self
            .get(module_name)
            .ok_or_else(|| SuiteError::UnknownModule {
                name: name.to_string(),
                available: self.names().iter().map(|n| n.to_string()).collect(),
            })?;
        match case_name {
            None => Ok(module
                .cases
                .iter()
                .map(|case| SuiteEntry {
                    module: module.name,
                    case: *case,
                })
                .collect()),
            Some(case_name) => {
                let case = module.case(case_name).ok_or_else(|| SuiteError::UnknownCase {
                    module: module.name.to_string(),
                    case: case_name.to_string(),
                })?;
                Ok(vec![SuiteEntry {
                    module: module.name,
                    case: *case,
                }])
            }
        }
    }
}

fn unqualified(name: &str) -> &str {
    name.strip_prefix(PACKAGE)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name)
}

// =============================================================================
// ASSERTION HELPERS
// =============================================================================

/// Fails the current case unless `cond` holds.
#[macro_export]
macro_rules! check {
    ($cond:expr) => {
        if !$cond {
            return Err($crate::suite::CaseError::Failed(format!(
                "check failed: {}",
                stringify!($cond)
            )));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::suite::CaseError::Failed(format!($($arg)+)));
        }
    };
}

/// Fails the current case unless both sides are equal.
#[macro_export]
macro_rules! check_eq {
    ($left:expr, $right:expr) => {{
        let (left, right) = (&$left, &$right);
        if left != right {
            return Err($crate::suite::CaseError::Failed(format!(
                "{} != {}\n  left: {:?}\n right: {:?}",
                stringify!($left),
                stringify!($right),
                left,
                right
            )));
        }
    }};
}

/// Skips the current case.
#[macro_export]
macro_rules! skip {
    ($($arg:tt)+) => {
        return Err($crate::suite::CaseError::Skipped(format!($($arg)+)))
    };
}

/// Passes only if `result` failed with exactly `kind`; returns the error for
/// further inspection.
pub fn expect_kind<T: fmt::Debug>(result: BridgeResult<T>, kind: ErrorKind) -> Result<BridgeError, CaseError> {
    match result {
        Ok(value) => Err(CaseError::Failed(format!(
            "expected {}, but the call returned {:?}",
            kind, value
        ))),
        Err(err) if err.kind() == Some(kind) => Ok(err),
        Err(err) => Err(CaseError::Failed(format!("expected {}, got: {}", kind, err))),
    }
}
