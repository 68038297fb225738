mod common;

use common::{started_runtime, ScriptedBackend};
use jt_jvm::fixtures::FixtureClasspath;
use jt_jvm::runtime::JavaValue;
use jt_jvm::suite::runner::{run_suite, Outcome, SilentReporter};
use jt_jvm::suite::{
    CaseError, CaseResult, SuiteError, SuiteRegistry, TestCase, TestContext, TestModule,
};
use jt_jvm::{check_eq, skip, ErrorMap, Runtime};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// SELECTION
// ============================================================================

#[test]
fn builtin_modules_are_registered_in_order() {
    let registry = SuiteRegistry::builtin();
    assert_eq!(
        registry.names(),
        vec!["lifecycle", "statics", "failures", "fixtures"]
    );
    assert!(registry.modules().iter().all(|m| !m.cases.is_empty()));
}

#[test]
fn unknown_module_fails_before_any_native_call() {
    let (backend, script) = ScriptedBackend::new();
    let _runtime = Runtime::new(backend, ErrorMap::standard());

    let err = SuiteRegistry::builtin()
        .select(Some(names(&["lifecycle", "no_such_module"]).as_slice()), &[])
        .unwrap_err();

    match &err {
        SuiteError::UnknownModule { name, available } => {
            assert_eq!(name, "no_such_module");
            assert!(available.contains(&"statics".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("no_such_module"));
    assert_eq!((script.creates(), script.calls()), (0, 0));
}

#[test]
fn qualified_names_and_omissions() {
    let registry = SuiteRegistry::builtin();
    let qualified = registry.select(Some(names(&["jt.lifecycle"]).as_slice()), &[]).unwrap();
    let short = registry.select(Some(names(&["lifecycle"]).as_slice()), &[]).unwrap();
    assert_eq!(qualified.len(), short.len());

    let everything = registry.select(None, &[]).unwrap();
    let without = registry.select(None, &names(&["fixtures", "jt.failures"])).unwrap();
    assert!(without
        .entries()
        .iter()
        .all(|e| e.module != "fixtures" && e.module != "failures"));
    assert!(without.len() < everything.len());
}

#[test]
fn single_case_selection() {
    let suite = SuiteRegistry::builtin()
        .select(Some(names(&["statics.int_call"]).as_slice()), &[])
        .unwrap();
    assert_eq!(suite.len(), 1);
    assert_eq!(suite.entries()[0].case.name, "int_call");
}

// ============================================================================
// EXECUTION
// ============================================================================

fn passes(ctx: &TestContext<'_>) -> CaseResult {
    let abs = ctx
        .runtime
        .call_static("java/lang/Math", "abs", "(I)I", vec![JavaValue::Int(-7)])?;
    check_eq!(abs, JavaValue::Int(7));
    Ok(())
}

fn fails(_: &TestContext<'_>) -> CaseResult {
    check_eq!(1 + 1, 3);
    Ok(())
}

fn errors(ctx: &TestContext<'_>) -> CaseResult {
    ctx.runtime.get_static("java/lang/Missing", "X", "I")?;
    Ok(())
}

fn skips(_: &TestContext<'_>) -> CaseResult {
    skip!("fixture absent");
}

fn panics(_: &TestContext<'_>) -> CaseResult {
    panic!("case blew up")
}

fn mixed_module() -> TestModule {
    TestModule {
        name: "mixed",
        description: "one of each outcome",
        cases: vec![
            TestCase { name: "passes", run: passes },
            TestCase { name: "fails", run: fails },
            TestCase { name: "errors", run: errors },
            TestCase { name: "skips", run: skips },
            TestCase { name: "panics", run: panics },
        ],
    }
}

#[test]
fn runner_records_every_outcome_and_keeps_going() {
    let (runtime, script) = started_runtime();
    script.respond(JavaValue::Int(7));
    script.respond_failure(jt_jvm::StatusCode::Err, "java.lang.NoClassDefFoundError: java/lang/Missing");

    let mut registry = SuiteRegistry::new();
    registry.register(mixed_module()).unwrap();
    let suite = registry.select(None, &[]).unwrap();
    let fixtures = FixtureClasspath::resolve("/nonexistent/jt-fixtures");
    let ctx = TestContext {
        runtime: &runtime,
        fixtures: &fixtures,
    };

    let summary = run_suite(&suite, &ctx, &mut SilentReporter);

    assert_eq!(summary.total(), 5);
    assert_eq!(
        (summary.passed, summary.failed, summary.errored, summary.skipped),
        (1, 1, 2, 1)
    );
    assert!(!summary.was_successful());
    let outcomes: Vec<_> = summary.records.iter().map(|r| r.outcome.label()).collect();
    assert_eq!(outcomes, vec!["ok", "FAIL", "ERROR", "skipped", "ERROR"]);
    assert!(matches!(
        &summary.records[4].outcome,
        Outcome::Errored(detail) if detail.contains("case blew up")
    ));
    assert!(runtime.is_running());
}

#[test]
fn summary_serializes_to_json() {
    let (runtime, _script) = started_runtime();
    let mut registry = SuiteRegistry::new();
    registry
        .register(TestModule {
            name: "tiny",
            description: "",
            cases: vec![TestCase { name: "skips", run: skips }],
        })
        .unwrap();
    let suite = registry.select(None, &[]).unwrap();
    let fixtures = FixtureClasspath::resolve("/nonexistent/jt-fixtures");
    let ctx = TestContext {
        runtime: &runtime,
        fixtures: &fixtures,
    };
    let summary = run_suite(&suite, &ctx, &mut SilentReporter);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["records"][0]["module"], "tiny");
    assert_eq!(json["records"][0]["outcome"], "skipped");
    assert_eq!(json["records"][0]["detail"], "fixture absent");
}

#[test]
fn case_error_wraps_bridge_errors() {
    let err = CaseError::from(jt_jvm::BridgeError::NotRunning);
    assert!(err.to_string().contains("not running"));
}
