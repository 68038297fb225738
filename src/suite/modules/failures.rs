//! Failed calls come back as translated errors and leave the runtime usable.

use crate::runtime::JavaValue;
use crate::status::{ErrorKind, StatusCode};
use crate::suite::{expect_kind, CaseResult, TestCase, TestContext, TestModule};
use crate::{check, check_eq};

pub fn module() -> TestModule {
    TestModule {
        name: "failures",
        description: "native and Java failures map to error kinds",
        cases: vec![
            TestCase { name: "missing_class", run: missing_class },
            TestCase { name: "missing_method", run: missing_method },
            TestCase { name: "missing_field", run: missing_field },
            TestCase { name: "java_exception", run: java_exception },
            TestCase { name: "argument_mismatch", run: argument_mismatch },
            TestCase { name: "malformed_signature", run: malformed_signature },
            TestCase { name: "unsupported_result_type", run: unsupported_result_type },
            TestCase { name: "usable_after_failures", run: usable_after_failures },
        ],
    }
}

fn missing_class(ctx: &TestContext<'_>) -> CaseResult {
    let result = ctx.runtime.call_static("org/jt/DoesNotExist", "run", "()V", Vec::new());
    let err = expect_kind(result, ErrorKind::Unknown)?;
    check_eq!(err.status(), Some(StatusCode::Err));
    let text = err.to_string();
    check!(text.contains("NoClassDefFoundError"), "no exception context in {:?}", text);
    check!(text.contains("org/jt/DoesNotExist"), "class not named in {:?}", text);
    Ok(())
}

fn missing_method(ctx: &TestContext<'_>) -> CaseResult {
    let result = ctx.runtime.call_static("java/lang/Math", "noSuchMethod", "()I", Vec::new());
    let err = expect_kind(result, ErrorKind::Unknown)?;
    check!(err.to_string().contains("NoSuchMethodError"), "{}", err);
    Ok(())
}

fn missing_field(ctx: &TestContext<'_>) -> CaseResult {
    let result = ctx.runtime.get_static("java/lang/Integer", "NO_SUCH_FIELD", "I");
    let err = expect_kind(result, ErrorKind::Unknown)?;
    check!(err.to_string().contains("NoSuchFieldError"), "{}", err);
    Ok(())
}

fn java_exception(ctx: &TestContext<'_>) -> CaseResult {
    let result = ctx.runtime.call_static(
        "java/lang/Integer",
        "parseInt",
        "(Ljava/lang/String;)I",
        vec![JavaValue::from("not a number")],
    );
    let err = expect_kind(result, ErrorKind::Unknown)?;
    check!(err.to_string().contains("NumberFormatException"), "{}", err);
    Ok(())
}

fn argument_mismatch(ctx: &TestContext<'_>) -> CaseResult {
    let wrong_type = ctx
        .runtime
        .call_static("java/lang/Math", "abs", "(I)I", vec![JavaValue::Long(-1)]);
    let err = expect_kind(wrong_type, ErrorKind::InvalidArgument)?;
    check_eq!(err.status(), Some(StatusCode::Inval));

    let wrong_arity = ctx.runtime.call_static("java/lang/Math", "abs", "(I)I", Vec::new());
    expect_kind(wrong_arity, ErrorKind::InvalidArgument)?;
    Ok(())
}

fn malformed_signature(ctx: &TestContext<'_>) -> CaseResult {
    let result = ctx
        .runtime
        .call_static("java/lang/Math", "abs", "(I", vec![JavaValue::Int(1)]);
    expect_kind(result, ErrorKind::InvalidArgument)?;
    Ok(())
}

fn unsupported_result_type(ctx: &TestContext<'_>) -> CaseResult {
    let result = ctx.runtime.call_static(
        "java/lang/System",
        "getProperties",
        "()Ljava/util/Properties;",
        Vec::new(),
    );
    expect_kind(result, ErrorKind::InvalidArgument)?;
    Ok(())
}

fn usable_after_failures(ctx: &TestContext<'_>) -> CaseResult {
    let _ = ctx.runtime.call_static("org/jt/DoesNotExist", "run", "()V", Vec::new());
    let _ = ctx.runtime.call_static(
        "java/lang/Integer",
        "parseInt",
        "(Ljava/lang/String;)I",
        vec![JavaValue::from("x")],
    );
    let abs = ctx
        .runtime
        .call_static("java/lang/Math", "abs", "(I)I", vec![JavaValue::Int(-3)])?;
    check_eq!(abs, JavaValue::Int(3));
    Ok(())
}
