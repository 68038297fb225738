//! # Scripted backend
//!
//! A [`NativeBackend`] that performs no native work. Tests script its
//! answers up front and inspect what the runtime asked of it through the
//! shared [`Script`].
//!
//! # Real JDK
//!
//! Helpers for the tests that need an actual Java installation: locating
//! the JVM and compiling the Java fixtures with `javac`.

#![allow(dead_code)]

use jt_jvm::config::HarnessConfig;
use jt_jvm::runtime::{JavaValue, NativeBackend, NativeFailure, Operation};
use jt_jvm::{ErrorMap, Runtime, StatusCode};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Script {
    creates: AtomicUsize,
    destroys: AtomicUsize,
    calls: AtomicUsize,
    attaches: AtomicUsize,
    detaches: AtomicUsize,
    create_failure: Mutex<Option<NativeFailure>>,
    destroy_failure: Mutex<Option<NativeFailure>>,
    responses: Mutex<VecDeque<Result<JavaValue, NativeFailure>>>,
    options: Mutex<Vec<String>>,
    operations: Mutex<Vec<String>>,
}

impl Script {
    pub fn fail_create(&self, status: StatusCode, context: &str) {
        *self.create_failure.lock() = Some(NativeFailure::new(status, context));
    }

    pub fn fail_destroy(&self, status: StatusCode, context: &str) {
        *self.destroy_failure.lock() = Some(NativeFailure::new(status, context));
    }

    /// Queues the result of the next `call`. Unscripted calls return `Void`.
    pub fn respond(&self, value: JavaValue) {
        self.responses.lock().push_back(Ok(value));
    }

    pub fn respond_failure(&self, status: StatusCode, context: &str) {
        self.responses
            .lock()
            .push_back(Err(NativeFailure::new(status, context)));
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn attaches(&self) -> usize {
        self.attaches.load(Ordering::SeqCst)
    }

    pub fn detaches(&self) -> usize {
        self.detaches.load(Ordering::SeqCst)
    }

    /// Options received by the last `create`.
    pub fn options(&self) -> Vec<String> {
        self.options.lock().clone()
    }

    /// Every operation that reached the backend, rendered.
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().clone()
    }
}

pub struct ScriptedBackend {
    script: Arc<Script>,
}

impl ScriptedBackend {
    pub fn new() -> (Self, Arc<Script>) {
        let script = Arc::new(Script::default());
        (
            Self {
                script: Arc::clone(&script),
            },
            script,
        )
    }
}

impl NativeBackend for ScriptedBackend {
    fn create(&mut self, options: &[String]) -> Result<(), NativeFailure> {
        self.script.creates.fetch_add(1, Ordering::SeqCst);
        *self.script.options.lock() = options.to_vec();
        match self.script.create_failure.lock().clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn call(&self, operation: &Operation) -> Result<JavaValue, NativeFailure> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        self.script.operations.lock().push(operation.to_string());
        self.script
            .responses
            .lock()
            .pop_front()
            .unwrap_or(Ok(JavaValue::Void))
    }

    fn attach_current_thread(&self) -> Result<(), NativeFailure> {
        self.script.attaches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn detach_current_thread(&self) -> Result<(), NativeFailure> {
        self.script.detaches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), NativeFailure> {
        self.script.destroys.fetch_add(1, Ordering::SeqCst);
        match self.script.destroy_failure.lock().clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        "scripted backend".to_string()
    }
}

/// A not-yet-started runtime over a fresh script, with the standard map.
pub fn scripted_runtime() -> (Runtime, Arc<Script>) {
    let (backend, script) = ScriptedBackend::new();
    (Runtime::new(backend, ErrorMap::standard()), script)
}

/// A running runtime over a fresh script.
pub fn started_runtime() -> (Runtime, Arc<Script>) {
    let (mut runtime, script) = scripted_runtime();
    runtime
        .start(["-Xmx64M"])
        .expect("scripted start cannot fail");
    (runtime, script)
}

// ============================================================================
// REAL JDK
// ============================================================================

/// The JVM library the harness would use, or `None` when this machine has
/// no Java installation.
pub fn locate_real_jvm() -> Option<PathBuf> {
    let mut config = HarnessConfig::default();
    config.apply_env(|key| std::env::var(key).ok());
    match config.locator().locate() {
        Ok(path) => Some(path),
        Err(err) => {
            eprintln!("no JVM available: {}", err);
            None
        }
    }
}

/// `javac` from the JDK that owns `jvm_library`, else from `PATH`.
pub fn find_javac(jvm_library: &Path) -> Option<PathBuf> {
    let javac = format!("javac{}", std::env::consts::EXE_SUFFIX);
    let beside_jvm = jvm_library
        .ancestors()
        .map(|dir| dir.join("bin").join(&javac))
        .find(|candidate| candidate.is_file());
    beside_jvm.or_else(|| {
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(&javac))
            .find(|candidate| candidate.is_file())
    })
}

/// Compiles the `org.python.Version` fixture into `<root>/classes` with its
/// properties file beside it. `None` when no `javac` can be found.
pub fn compile_fixtures(jvm_library: &Path, root: &Path) -> Option<PathBuf> {
    let Some(javac) = find_javac(jvm_library) else {
        eprintln!("no javac next to {} or on PATH", jvm_library.display());
        return None;
    };
    let sources = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/java/src/org/python");
    let classes = root.join("classes");

    let status = Command::new(&javac)
        .arg("-d")
        .arg(&classes)
        .arg(sources.join("Version.java"))
        .status()
        .unwrap();
    assert!(status.success(), "{} failed on the Version fixture", javac.display());

    let package = classes.join("org/python");
    fs::copy(sources.join("version.properties"), package.join("version.properties")).unwrap();
    Some(root.to_path_buf())
}
