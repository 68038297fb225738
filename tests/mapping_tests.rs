mod common;

use common::ScriptedBackend;
use jt_jvm::runtime::Operation;
use jt_jvm::{ErrorKind, ErrorMap, Runtime, StatusCode};

#[test]
fn standard_map_covers_every_failure_code() {
    let map = ErrorMap::standard();
    assert!(map.uncovered().is_empty());
    assert_eq!(map.len(), StatusCode::FAILURES.len());
    assert!(map.aliases().is_empty());
    let expected = [
        (StatusCode::Err, "UnknownError"),
        (StatusCode::Detached, "ThreadNotAttachedError"),
        (StatusCode::Version, "VersionNotSupportedError"),
        (StatusCode::NoMem, "NotEnoughMemoryError"),
        (StatusCode::Exist, "JVMAlreadyExistError"),
        (StatusCode::Inval, "InvalidArgumentError"),
    ];
    for (code, name) in expected {
        assert_eq!(map.resolve(code).as_str(), name, "{code}");
    }
}

#[test]
fn unregistered_codes_resolve_to_unknown() {
    let map = ErrorMap::new();
    for code in StatusCode::FAILURES {
        assert_eq!(map.resolve(code), ErrorKind::Unknown);
    }
    assert_eq!(map.resolve(StatusCode::Other(-99)), ErrorKind::Unknown);
    assert_eq!(map.uncovered().len(), 6);
}

#[test]
fn partial_map_reports_its_gaps() {
    let map: ErrorMap = [
        (StatusCode::Detached, ErrorKind::ThreadNotAttached),
        (StatusCode::Inval, ErrorKind::InvalidArgument),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        map.uncovered(),
        vec![
            StatusCode::Err,
            StatusCode::Version,
            StatusCode::NoMem,
            StatusCode::Exist
        ]
    );
}

#[test]
fn runtime_translates_through_the_map_it_was_given() {
    let mut map = ErrorMap::standard();
    map.register(StatusCode::Detached, ErrorKind::Unknown);

    let (backend, script) = ScriptedBackend::new();
    let mut runtime = Runtime::new(backend, map);
    runtime.start(["-ea"]).unwrap();

    script.respond_failure(StatusCode::Detached, "GetEnv failed");
    let err = runtime
        .invoke(&Operation::call_static("java/lang/System", "gc", "()V", vec![]))
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Unknown));
    assert_eq!(err.status(), Some(StatusCode::Detached));
    assert_eq!(
        runtime.error_map().aliases(),
        vec![(ErrorKind::Unknown, vec![StatusCode::Err, StatusCode::Detached])]
    );
}
