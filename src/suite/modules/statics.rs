//! Static method calls and static field reads against JDK classes.

use crate::runtime::JavaValue;
use crate::suite::{CaseResult, TestCase, TestContext, TestModule};
use crate::{check, check_eq};

const MATH: &str = "java/lang/Math";

pub fn module() -> TestModule {
    TestModule {
        name: "statics",
        description: "static calls and field reads for each result type",
        cases: vec![
            TestCase { name: "int_field", run: int_field },
            TestCase { name: "int_call", run: int_call },
            TestCase { name: "long_call", run: long_call },
            TestCase { name: "double_call", run: double_call },
            TestCase { name: "boolean_call", run: boolean_call },
            TestCase { name: "char_call", run: char_call },
            TestCase { name: "string_call", run: string_call },
            TestCase { name: "supplementary_string", run: supplementary_string },
            TestCase { name: "null_string", run: null_string },
            TestCase { name: "void_call", run: void_call },
            TestCase { name: "dotted_class_names", run: dotted_class_names },
        ],
    }
}

fn int_field(ctx: &TestContext<'_>) -> CaseResult {
    let max = ctx.runtime.get_static("java/lang/Integer", "MAX_VALUE", "I")?;
    check_eq!(max, JavaValue::Int(i32::MAX));
    let min = ctx.runtime.get_static("java/lang/Long", "MIN_VALUE", "J")?;
    check_eq!(min, JavaValue::Long(i64::MIN));
    Ok(())
}

fn int_call(ctx: &TestContext<'_>) -> CaseResult {
    let abs = ctx.runtime.call_static(MATH, "abs", "(I)I", vec![JavaValue::Int(-7)])?;
    check_eq!(abs, JavaValue::Int(7));
    let max = ctx
        .runtime
        .call_static(MATH, "max", "(II)I", vec![JavaValue::Int(3), JavaValue::Int(11)])?;
    check_eq!(max.as_int(), Some(11));
    Ok(())
}

fn long_call(ctx: &TestContext<'_>) -> CaseResult {
    let sum = ctx.runtime.call_static(
        MATH,
        "addExact",
        "(JJ)J",
        vec![JavaValue::Long(1 << 40), JavaValue::Long(2)],
    )?;
    check_eq!(sum.as_long(), Some((1 << 40) + 2));
    Ok(())
}

fn double_call(ctx: &TestContext<'_>) -> CaseResult {
    let root = ctx
        .runtime
        .call_static(MATH, "sqrt", "(D)D", vec![JavaValue::Double(16.0)])?;
    check_eq!(root, JavaValue::Double(4.0));
    let pi = ctx.runtime.get_static(MATH, "PI", "D")?;
    check_eq!(pi, JavaValue::Double(std::f64::consts::PI));
    Ok(())
}

fn boolean_call(ctx: &TestContext<'_>) -> CaseResult {
    let parsed = ctx.runtime.call_static(
        "java/lang/Boolean",
        "parseBoolean",
        "(Ljava/lang/String;)Z",
        vec![JavaValue::from("TRUE")],
    )?;
    check_eq!(parsed.as_bool(), Some(true));
    Ok(())
}

fn char_call(ctx: &TestContext<'_>) -> CaseResult {
    let upper = ctx.runtime.call_static(
        "java/lang/Character",
        "toUpperCase",
        "(C)C",
        vec![JavaValue::Char(u16::from(b'a'))],
    )?;
    check_eq!(upper, JavaValue::Char(u16::from(b'A')));
    Ok(())
}

fn string_call(ctx: &TestContext<'_>) -> CaseResult {
    let text = ctx.runtime.call_static(
        "java/lang/String",
        "valueOf",
        "(I)Ljava/lang/String;",
        vec![JavaValue::Int(42)],
    )?;
    check_eq!(text.as_str(), Some("42"));
    let echoed = ctx.runtime.call_static(
        "java/lang/String",
        "valueOf",
        "(Ljava/lang/Object;)Ljava/lang/String;",
        vec![JavaValue::from("naïve ✓")],
    )?;
    check_eq!(echoed.as_str(), Some("naïve ✓"));
    Ok(())
}

fn supplementary_string(ctx: &TestContext<'_>) -> CaseResult {
    let echoed = ctx.runtime.call_static(
        "java/lang/String",
        "valueOf",
        "(Ljava/lang/Object;)Ljava/lang/String;",
        vec![JavaValue::from("a😀b")],
    )?;
    check_eq!(echoed.as_str(), Some("a😀b"));
    let code_point = ctx.runtime.call_static(
        "java/lang/Character",
        "codePointAt",
        "(Ljava/lang/CharSequence;I)I",
        vec![JavaValue::from("a😀b"), JavaValue::Int(1)],
    )?;
    check_eq!(code_point.as_int(), Some(0x1F600));
    Ok(())
}

fn null_string(ctx: &TestContext<'_>) -> CaseResult {
    let value = ctx.runtime.system_property("jt.property.that.is.never.set")?;
    check!(value.is_none(), "expected no value, got {:?}", value);
    Ok(())
}

fn void_call(ctx: &TestContext<'_>) -> CaseResult {
    let result = ctx.runtime.call_static(
        "java/lang/Thread",
        "yield",
        "()V",
        Vec::new(),
    )?;
    check_eq!(result, JavaValue::Void);
    Ok(())
}

fn dotted_class_names(ctx: &TestContext<'_>) -> CaseResult {
    let max = ctx.runtime.get_static("java.lang.Short", "MAX_VALUE", "S")?;
    check_eq!(max, JavaValue::Short(i16::MAX));
    Ok(())
}
