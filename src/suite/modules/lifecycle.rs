//! The runtime is up, describes itself, and enforces thread attachment.

use crate::errors::BridgeResult;
use crate::runtime::Runtime;
use crate::status::ErrorKind;
use crate::suite::{expect_kind, CaseError, CaseResult, TestCase, TestContext, TestModule};
use crate::{check, check_eq};
use std::thread;

pub fn module() -> TestModule {
    TestModule {
        name: "lifecycle",
        description: "runtime state, VM identity and thread attachment",
        cases: vec![
            TestCase { name: "runtime_is_running", run: runtime_is_running },
            TestCase { name: "vm_description", run: vm_description },
            TestCase { name: "classpath_is_forwarded", run: classpath_is_forwarded },
            TestCase { name: "unattached_thread_is_rejected", run: unattached_thread_is_rejected },
            TestCase { name: "attached_thread_can_call", run: attached_thread_can_call },
            TestCase { name: "nested_attach_is_counted", run: nested_attach_is_counted },
        ],
    }
}

/// Runs `body` on a fresh thread and waits for it.
fn on_other_thread<T, F>(runtime: &Runtime, body: F) -> Result<T, CaseError>
where
    T: Send,
    F: FnOnce(&Runtime) -> T + Send,
{
    thread::scope(|scope| scope.spawn(|| body(runtime)).join())
        .map_err(|_| CaseError::Failed("worker thread panicked".to_string()))
}

fn runtime_is_running(ctx: &TestContext<'_>) -> CaseResult {
    check!(ctx.runtime.is_running());
    check!(ctx.runtime.is_current_thread_attached(), "the starting thread should be attached");
    check!(ctx.runtime.attached_threads() >= 1);
    Ok(())
}

fn vm_description(ctx: &TestContext<'_>) -> CaseResult {
    let description = ctx.runtime.vm_description()?;
    check!(
        description.starts_with('[') && description.ends_with(")]"),
        "unexpected VM description {:?}",
        description
    );
    let name = ctx.runtime.system_property("java.vm.name")?.unwrap_or_default();
    check!(!name.is_empty(), "java.vm.name is empty");
    check!(description.contains(&name));
    Ok(())
}

fn classpath_is_forwarded(ctx: &TestContext<'_>) -> CaseResult {
    let Some(option) = ctx
        .runtime
        .options()
        .iter()
        .find_map(|o| o.strip_prefix("-Djava.class.path="))
    else {
        crate::skip!("runtime was started without a class path option");
    };
    let property = ctx.runtime.system_property("java.class.path")?;
    check_eq!(property.as_deref(), Some(option));
    Ok(())
}

fn unattached_thread_is_rejected(ctx: &TestContext<'_>) -> CaseResult {
    let result: BridgeResult<Option<String>> =
        on_other_thread(ctx.runtime, |rt| rt.system_property("java.version"))?;
    let err = expect_kind(result, ErrorKind::ThreadNotAttached)?;
    check!(
        err.to_string().contains("ThreadNotAttachedError"),
        "message should name the kind: {}",
        err
    );
    // still usable from the owning thread
    check!(ctx.runtime.system_property("java.version")?.is_some());
    Ok(())
}

fn attached_thread_can_call(ctx: &TestContext<'_>) -> CaseResult {
    let before = ctx.runtime.attached_threads();
    let (version, during) = on_other_thread(ctx.runtime, |rt| {
        let _guard = rt.attach_current_thread()?;
        let version = rt.system_property("java.version")?;
        BridgeResult::Ok((version, rt.attached_threads()))
    })??;
    check!(version.is_some(), "java.version should be set");
    check_eq!(during, before + 1);
    check_eq!(ctx.runtime.attached_threads(), before);
    Ok(())
}

fn nested_attach_is_counted(ctx: &TestContext<'_>) -> CaseResult {
    let still_attached = on_other_thread(ctx.runtime, |rt| {
        let outer = rt.attach_current_thread()?;
        {
            let _inner = rt.attach_current_thread()?;
        }
        let attached = rt.is_current_thread_attached();
        drop(outer);
        BridgeResult::Ok((attached, rt.is_current_thread_attached()))
    })??;
    check_eq!(still_attached, (true, false));
    Ok(())
}
