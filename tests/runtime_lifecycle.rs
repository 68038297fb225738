mod common;

use common::{scripted_runtime, started_runtime};
use jt_jvm::runtime::{JavaValue, LifecycleState, Operation};
use jt_jvm::{BridgeError, ErrorKind, StatusCode};
use std::thread;

// ============================================================================
// START AND SHUTDOWN
// ============================================================================

#[test]
fn start_forwards_options_verbatim_and_in_order() {
    let (mut runtime, script) = scripted_runtime();
    let options = ["-Djava.class.path=tests/java/classes", "-ea", "-Xms16M", "-Xmx512M"];
    runtime.start(options).unwrap();

    assert_eq!(runtime.state(), LifecycleState::Running);
    assert_eq!(script.options(), options);
    assert_eq!(runtime.options(), options);
}

#[test]
fn second_start_is_already_running() {
    let (mut runtime, script) = started_runtime();
    let err = runtime.start(["-ea"]).unwrap_err();
    assert!(matches!(err, BridgeError::AlreadyRunning));
    assert_eq!(script.creates(), 1);
}

#[test]
fn failed_start_is_translated_and_released_once() {
    let (mut runtime, script) = scripted_runtime();
    script.fail_create(StatusCode::NoMem, "heap reservation failed");

    let err = runtime.start(["-Xmx900G"]).unwrap_err();
    match &err {
        BridgeError::Startup { status, kind, diagnostic } => {
            assert_eq!(*status, StatusCode::NoMem);
            assert_eq!(*kind, ErrorKind::NotEnoughMemory);
            assert_eq!(diagnostic, "heap reservation failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(runtime.state(), LifecycleState::Failed);

    runtime.shutdown().unwrap();
    runtime.shutdown().unwrap();
    drop(runtime);
    assert_eq!(script.destroys(), 1);
}

#[test]
fn existing_vm_maps_to_already_exists() {
    let (mut runtime, script) = scripted_runtime();
    script.fail_create(StatusCode::Exist, "a JVM was already created in this process");
    let err = runtime.start(Vec::<String>::new()).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyExists));
}

#[test]
fn restart_after_shutdown_is_refused() {
    let (mut runtime, script) = started_runtime();
    runtime.shutdown().unwrap();
    let err = runtime.start(["-ea"]).unwrap_err();
    assert!(matches!(err, BridgeError::Startup { .. }));
    assert_eq!(script.creates(), 1);
}

#[test]
fn shutdown_without_start_releases_nothing() {
    let (mut runtime, script) = scripted_runtime();
    runtime.shutdown().unwrap();
    assert_eq!(runtime.state(), LifecycleState::ShutDown);
    assert_eq!(script.destroys(), 0);
}

#[test]
fn shutdown_failure_is_reported_once() {
    let (mut runtime, script) = started_runtime();
    script.fail_destroy(StatusCode::Err, "DestroyJavaVM failed");
    let err = runtime.shutdown().unwrap_err();
    assert!(matches!(err, BridgeError::Shutdown { kind: ErrorKind::Unknown, .. }));
    runtime.shutdown().unwrap();
    assert_eq!(script.destroys(), 1);
}

#[test]
fn drop_releases_a_running_vm() {
    let (runtime, script) = started_runtime();
    drop(runtime);
    assert_eq!(script.destroys(), 1);
}

// ============================================================================
// INVOKE
// ============================================================================

#[test]
fn invoke_returns_backend_value() {
    let (runtime, script) = started_runtime();
    script.respond(JavaValue::Int(7));
    let value = runtime
        .call_static("java.lang.Math", "abs", "(I)I", vec![JavaValue::Int(-7)])
        .unwrap();
    assert_eq!(value, JavaValue::Int(7));
    assert_eq!(script.operations(), vec!["java/lang/Math.abs(I)I"]);
}

#[test]
fn invoke_before_start_and_after_shutdown_is_not_running() {
    let (mut runtime, script) = scripted_runtime();
    let op = Operation::get_static("java/lang/Integer", "MAX_VALUE", "I");
    assert!(matches!(runtime.invoke(&op), Err(BridgeError::NotRunning)));

    runtime.start(["-ea"]).unwrap();
    runtime.shutdown().unwrap();
    assert!(matches!(runtime.invoke(&op), Err(BridgeError::NotRunning)));
    assert_eq!(script.calls(), 0);
}

#[test]
fn backend_failures_are_translated() {
    let (runtime, script) = started_runtime();
    script.respond_failure(StatusCode::Detached, "GetEnv: thread not attached");
    script.respond_failure(StatusCode::Version, "JNI version unsupported");
    script.respond_failure(StatusCode::Other(-42), "vendor specific");

    let op = Operation::call_static("java/lang/System", "gc", "()V", vec![]);
    let kinds: Vec<_> = (0..3)
        .map(|_| runtime.invoke(&op).unwrap_err().kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(ErrorKind::ThreadNotAttached),
            Some(ErrorKind::VersionNotSupported),
            Some(ErrorKind::Unknown),
        ]
    );
}

#[test]
fn native_error_keeps_status_operation_and_context() {
    let (runtime, script) = started_runtime();
    script.respond_failure(
        StatusCode::Err,
        "java.lang.NumberFormatException: For input string: \"x\"",
    );
    let err = runtime
        .call_static(
            "java/lang/Integer",
            "parseInt",
            "(Ljava/lang/String;)I",
            vec![JavaValue::from("x")],
        )
        .unwrap_err();
    let BridgeError::Native(native) = err else {
        panic!("expected a native error");
    };
    assert_eq!(native.kind, ErrorKind::Unknown);
    assert_eq!(native.status, StatusCode::Err);
    assert_eq!(native.operation, "java/lang/Integer.parseInt(Ljava/lang/String;)I");
    assert!(native.context.contains("NumberFormatException"));
}

#[test]
fn mismatched_arguments_never_reach_the_backend() {
    let (runtime, script) = started_runtime();
    let err = runtime
        .call_static("java/lang/Math", "abs", "(I)I", vec![JavaValue::from("seven")])
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));
    assert_eq!(err.status(), Some(StatusCode::Inval));
    assert_eq!(script.calls(), 0);
}

#[test]
fn system_property_maps_null_to_none() {
    let (runtime, script) = started_runtime();
    script.respond(JavaValue::Null);
    script.respond(JavaValue::from("17.0.2"));
    assert_eq!(runtime.system_property("unset").unwrap(), None);
    assert_eq!(
        runtime.system_property("java.version").unwrap().as_deref(),
        Some("17.0.2")
    );
}

#[test]
fn vm_description_combines_name_and_vendor() {
    let (runtime, script) = started_runtime();
    script.respond(JavaValue::from("OpenJDK 64-Bit Server VM"));
    script.respond(JavaValue::from("Eclipse Adoptium"));
    assert_eq!(
        runtime.vm_description().unwrap(),
        "[OpenJDK 64-Bit Server VM (Eclipse Adoptium)]"
    );
}

// ============================================================================
// THREADS
// ============================================================================

#[test]
fn unattached_thread_is_rejected_without_native_call() {
    let (runtime, script) = started_runtime();
    let op = Operation::get_static("java/lang/Integer", "MAX_VALUE", "I");

    let result = thread::scope(|s| s.spawn(|| runtime.invoke(&op)).join().unwrap());

    let err = result.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::ThreadNotAttached));
    assert_eq!(err.status(), Some(StatusCode::Detached));
    assert_eq!(script.calls(), 0);
}

#[test]
fn attached_thread_is_accepted_and_detached_on_drop() {
    let (runtime, script) = started_runtime();
    script.respond(JavaValue::Int(i32::MAX));
    let op = Operation::get_static("java/lang/Integer", "MAX_VALUE", "I");

    let value = thread::scope(|s| {
        s.spawn(|| {
            let _guard = runtime.attach_current_thread().unwrap();
            assert!(runtime.is_current_thread_attached());
            runtime.invoke(&op)
        })
        .join()
        .unwrap()
    });

    assert_eq!(value.unwrap(), JavaValue::Int(i32::MAX));
    assert_eq!(script.attaches(), 1);
    assert_eq!(script.detaches(), 1);
    assert_eq!(runtime.attached_threads(), 1);
}

#[test]
fn nested_guards_attach_and_detach_once() {
    let (runtime, script) = started_runtime();
    thread::scope(|s| {
        s.spawn(|| {
            let outer = runtime.attach_current_thread().unwrap();
            let inner = runtime.attach_current_thread().unwrap();
            drop(inner);
            assert!(runtime.is_current_thread_attached());
            drop(outer);
            assert!(!runtime.is_current_thread_attached());
        });
    });
    assert_eq!(script.attaches(), 1);
    assert_eq!(script.detaches(), 1);
}

#[test]
fn owner_thread_guard_does_not_detach() {
    let (runtime, script) = started_runtime();
    drop(runtime.attach_current_thread().unwrap());
    assert!(runtime.is_current_thread_attached());
    assert_eq!(script.attaches(), 0);
    assert_eq!(script.detaches(), 0);
}

#[test]
fn attach_requires_a_running_runtime() {
    let (runtime, _script) = scripted_runtime();
    assert!(matches!(
        runtime.attach_current_thread(),
        Err(BridgeError::NotRunning)
    ));
}

// ============================================================================
// SCOPED USE
// ============================================================================

#[test]
fn run_scoped_shuts_down_after_body() {
    let (runtime, script) = scripted_runtime();
    let scoped = runtime
        .run_scoped(["-ea"], |rt| {
            assert!(rt.is_running());
            41 + 1
        })
        .unwrap();
    assert_eq!(scoped.value, 42);
    assert!(scoped.shutdown.is_ok());
    assert_eq!((script.creates(), script.destroys()), (1, 1));
}

#[test]
fn run_scoped_releases_after_failed_start() {
    let (runtime, script) = scripted_runtime();
    script.fail_create(StatusCode::Inval, "Unrecognized option: -Xbogus");
    let mut ran = false;
    let err = runtime
        .run_scoped(["-Xbogus"], |_| ran = true)
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));
    assert!(!ran);
    assert_eq!(script.destroys(), 1);
}

#[test]
fn run_scoped_shutdown_failure_keeps_the_value() {
    let (runtime, script) = scripted_runtime();
    script.fail_destroy(StatusCode::Err, "DestroyJavaVM failed");
    let scoped = runtime
        .run_scoped(Vec::<String>::new(), |_| Err::<(), &str>("test failed"))
        .unwrap();
    assert_eq!(scoped.value, Err("test failed"));
    assert!(matches!(scoped.shutdown, Err(BridgeError::Shutdown { .. })));
    assert_eq!(script.destroys(), 1);
}

#[test]
fn run_scoped_releases_when_body_panics() {
    let (runtime, script) = scripted_runtime();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        runtime.run_scoped(["-ea"], |_| -> () { panic!("body failed") })
    }));
    assert!(outcome.is_err());
    assert_eq!(script.destroys(), 1);
}
