//! Calls into the compiled `org.python.Version` fixture.
//!
//! Every case skips when the class was not built into the fixture directory.

use crate::runtime::JavaValue;
use crate::suite::{CaseError, CaseResult, TestCase, TestContext, TestModule};
use crate::{check, check_eq, skip};

const VERSION: &str = "org/python/Version";
const STRING: &str = "Ljava/lang/String;";

pub fn module() -> TestModule {
    TestModule {
        name: "fixtures",
        description: "the org.python.Version fixture class",
        cases: vec![
            TestCase { name: "version_fields", run: version_fields },
            TestCase { name: "vm_matches_runtime", run: vm_matches_runtime },
            TestCase { name: "build_info", run: build_info },
            TestCase { name: "version_string", run: version_string },
        ],
    }
}

fn require_version(ctx: &TestContext<'_>) -> CaseResult {
    if !ctx.fixtures.contains_class(VERSION) {
        skip!(
            "{} not found under {}",
            VERSION,
            ctx.fixtures.classpath_dir().display()
        );
    }
    Ok(())
}

fn static_string(ctx: &TestContext<'_>, method: &str) -> Result<String, CaseError> {
    let signature = format!("(){}", STRING);
    match ctx.runtime.call_static(VERSION, method, &signature, Vec::new())? {
        JavaValue::String(value) => Ok(value),
        other => Err(CaseError::Failed(format!(
            "{}.{} returned {:?}",
            VERSION, method, other
        ))),
    }
}

fn version_fields(ctx: &TestContext<'_>) -> CaseResult {
    require_version(ctx)?;
    let version = ctx.runtime.get_static(VERSION, "PY_VERSION", STRING)?;
    let Some(version) = version.as_str() else {
        return Err(CaseError::Failed(format!("PY_VERSION is {:?}", version)));
    };
    let major = ctx.runtime.get_static(VERSION, "PY_MAJOR_VERSION", "I")?;
    let minor = ctx.runtime.get_static(VERSION, "PY_MINOR_VERSION", "I")?;
    let (Some(major), Some(minor)) = (major.as_int(), minor.as_int()) else {
        return Err(CaseError::Failed("version numbers are not ints".to_string()));
    };
    check!(major > 0, "PY_MAJOR_VERSION is {}", major);
    let prefix = format!("{}.{}", major, minor);
    check!(
        version.starts_with(&prefix),
        "PY_VERSION {:?} does not start with {}",
        version,
        prefix
    );
    Ok(())
}

fn vm_matches_runtime(ctx: &TestContext<'_>) -> CaseResult {
    require_version(ctx)?;
    let from_java = static_string(ctx, "getVM")?;
    check_eq!(from_java, ctx.runtime.vm_description()?);
    Ok(())
}

fn build_info(ctx: &TestContext<'_>) -> CaseResult {
    require_version(ctx)?;
    let info = static_string(ctx, "getBuildInfo")?;
    // <identifier>[:<revision>], <date>, <time>
    check_eq!(info.matches(", ").count(), 2);
    Ok(())
}

fn version_string(ctx: &TestContext<'_>) -> CaseResult {
    require_version(ctx)?;
    let full = static_string(ctx, "getVersion")?;
    let Some((first, vm)) = full.split_once('\n') else {
        return Err(CaseError::Failed(format!("no VM line in {:?}", full)));
    };
    let version = ctx.runtime.get_static(VERSION, "PY_VERSION", STRING)?;
    check!(
        version.as_str().is_some_and(|v| first.starts_with(v)),
        "{:?} does not start with PY_VERSION",
        first
    );
    check_eq!(vm.to_string(), static_string(ctx, "getVM")?);
    Ok(())
}
