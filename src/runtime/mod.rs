//! The runtime handle: one embedded JVM, its lifecycle, and the single place
//! where failed native calls are translated into [`BridgeError`]s.
//!
//! ## Lifecycle
//! ```text
//! Uninitialized --start ok--> Running --shutdown--> ShutDown
//!       |                                              ^
//!       +--start fails--> Failed ------shutdown--------+
//! ```
//! `ShutDown` is terminal. `Failed` still owns whatever the backend acquired
//! before the failure, so it is released by `shutdown` (or by `Drop`) exactly
//! once, like a running VM.
//!
//! ## Usage Workflow
//! ```rust,no_run
//! use jt_jvm::mapping::ErrorMap;
//! use jt_jvm::runtime::{jni::JniBackend, Runtime};
//!
//! let backend = JniBackend::new("/usr/lib/jvm/default/lib/server/libjvm.so");
//! let runtime = Runtime::new(backend, ErrorMap::standard());
//! let run = runtime
//!     .run_scoped(["-Xmx64M"], |rt| rt.vm_description())
//!     .expect("JVM should start");
//! println!("{:?}", run.value);
//! ```

pub mod backend;
pub mod jni;
pub mod signature;
pub mod thread;
pub mod value;

pub use backend::{NativeBackend, NativeFailure};
pub use thread::AttachGuard;
pub use value::{JavaValue, Operation};

use crate::errors::{BridgeError, BridgeResult, NativeError};
use crate::mapping::ErrorMap;
use crate::status::StatusCode;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thread::AttachRegistry;

/// Where a [`Runtime`] is in its one-way lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Uninitialized,
    Running,
    /// `start` was attempted and failed; resources may still need release.
    Failed,
    ShutDown,
}

/// The result of [`Runtime::run_scoped`]: the body's value and the outcome
/// of the shutdown that followed it.
#[derive(Debug)]
pub struct Scoped<T> {
    pub value: T,
    pub shutdown: BridgeResult<()>,
}

/// Owns one embedded JVM instance for its whole life.
pub struct Runtime {
    pub(crate) backend: Box<dyn NativeBackend>,
    errors: Arc<ErrorMap>,
    state: LifecycleState,
    options: Vec<String>,
    pub(crate) threads: AttachRegistry,
}

impl Runtime {
    /// Takes ownership of the error map; it cannot be changed afterwards.
    pub fn new<B: NativeBackend + 'static>(backend: B, errors: ErrorMap) -> Self {
        Self::with_shared_errors(Box::new(backend), Arc::new(errors))
    }

    pub fn with_shared_errors(backend: Box<dyn NativeBackend>, errors: Arc<ErrorMap>) -> Self {
        Self {
            backend,
            errors,
            state: LifecycleState::Uninitialized,
            options: Vec::new(),
            threads: AttachRegistry::default(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    /// The options the runtime was started with, in order.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn error_map(&self) -> &ErrorMap {
        &self.errors
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Creates the VM. Options are forwarded verbatim.
    ///
    /// # Errors
    /// - [`BridgeError::AlreadyRunning`] if this handle is running.
    /// - [`BridgeError::Startup`] if the backend refuses, or if this handle
    ///   has already failed or shut down.
    pub fn start<I, S>(&mut self, options: I) -> BridgeResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.state {
            LifecycleState::Running => return Err(BridgeError::AlreadyRunning),
            LifecycleState::Failed => {
                return Err(self.startup_refused(
                    "a previous startup attempt failed; the runtime cannot be restarted",
                ))
            }
            LifecycleState::ShutDown => {
                return Err(self.startup_refused(
                    "the runtime was shut down and cannot be restarted in-process",
                ))
            }
            LifecycleState::Uninitialized => {}
        }

        self.options = options.into_iter().map(Into::into).collect();
        log::info!(
            "starting {} with {} option(s)",
            self.backend.describe(),
            self.options.len()
        );
        for option in &self.options {
            log::debug!("  jvm option: {}", option);
        }

        match self.backend.create(&self.options) {
            Ok(()) => {
                self.state = LifecycleState::Running;
                self.threads.set_owner(std::thread::current().id());
                Ok(())
            }
            Err(failure) => {
                self.state = LifecycleState::Failed;
                log::debug!("startup failed: {}", failure);
                Err(BridgeError::Startup {
                    status: failure.status,
                    kind: self.errors.resolve(failure.status),
                    diagnostic: failure.context,
                })
            }
        }
    }

    /// Releases the VM. Idempotent: releasing happens at most once, and
    /// calling this on a handle that never acquired anything is a no-op.
    pub fn shutdown(&mut self) -> BridgeResult<()> {
        match self.state {
            LifecycleState::ShutDown => Ok(()),
            LifecycleState::Uninitialized => {
                self.state = LifecycleState::ShutDown;
                Ok(())
            }
            LifecycleState::Running | LifecycleState::Failed => {
                let previous = self.state;
                self.state = LifecycleState::ShutDown;
                self.threads.clear();
                log::info!("shutting down {} (was {:?})", self.backend.describe(), previous);
                self.backend.destroy().map_err(|failure| BridgeError::Shutdown {
                    status: failure.status,
                    kind: self.errors.resolve(failure.status),
                    diagnostic: failure.context,
                })
            }
        }
    }

    /// Starts the runtime, runs `body`, and shuts down on every exit path.
    ///
    /// A startup failure is returned after the partial start is released.
    /// A shutdown failure is reported in [`Scoped::shutdown`] and never
    /// replaces the body's value. If `body` panics, `Drop` releases the VM
    /// while unwinding.
    pub fn run_scoped<I, S, T, F>(mut self, options: I, body: F) -> BridgeResult<Scoped<T>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(&Runtime) -> T,
    {
        if let Err(err) = self.start(options) {
            if let Err(release) = self.shutdown() {
                log::warn!("release after failed startup also failed: {}", release);
            }
            return Err(err);
        }
        let value = body(&self);
        let shutdown = self.shutdown();
        Ok(Scoped { value, shutdown })
    }

    // ------------------------------------------------------------------------
    // Threads
    // ------------------------------------------------------------------------

    /// Attaches the calling thread until the returned guard is dropped.
    pub fn attach_current_thread(&self) -> BridgeResult<AttachGuard<'_>> {
        if !self.is_running() {
            return Err(BridgeError::NotRunning);
        }
        let id = std::thread::current().id();
        if self.threads.is_owner(id) {
            return Ok(AttachGuard::new(self, false));
        }
        if self.threads.acquire(id) {
            if let Err(failure) = self.backend.attach_current_thread() {
                self.threads.forget(id);
                return Err(self.translate(&"AttachCurrentThread", failure));
            }
            log::debug!("attached thread {:?}", id);
        }
        Ok(AttachGuard::new(self, true))
    }

    pub fn is_current_thread_attached(&self) -> bool {
        self.threads.is_attached(std::thread::current().id())
    }

    /// Number of threads currently attached, including the owning thread.
    pub fn attached_threads(&self) -> usize {
        self.threads.attached_count()
    }

    // ------------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------------

    /// Performs `operation` on the calling thread.
    ///
    /// Every failure, including arguments that do not fit the signature and
    /// calls from unattached threads, comes back as a translated
    /// [`BridgeError::Native`].
    pub fn invoke(&self, operation: &Operation) -> BridgeResult<JavaValue> {
        if !self.is_running() {
            return Err(BridgeError::NotRunning);
        }
        let id = std::thread::current().id();
        if !self.threads.is_attached(id) {
            return Err(self.translate(
                operation,
                NativeFailure::new(
                    StatusCode::Detached,
                    format!("thread {:?} is not attached to the JVM", id),
                ),
            ));
        }
        if let Err(invalid) = operation.validate() {
            return Err(self.translate(
                operation,
                NativeFailure::new(StatusCode::Inval, invalid.to_string()),
            ));
        }
        log::trace!("invoke {}", operation);
        self.backend
            .call(operation)
            .map_err(|failure| self.translate(operation, failure))
    }

    pub fn call_static(
        &self,
        class: &str,
        method: &str,
        signature: &str,
        args: Vec<JavaValue>,
    ) -> BridgeResult<JavaValue> {
        self.invoke(&Operation::call_static(class, method, signature, args))
    }

    pub fn get_static(&self, class: &str, field: &str, signature: &str) -> BridgeResult<JavaValue> {
        self.invoke(&Operation::get_static(class, field, signature))
    }

    /// `System.getProperty(key)`; `None` when the property is unset.
    pub fn system_property(&self, key: &str) -> BridgeResult<Option<String>> {
        let operation = Operation::call_static(
            "java/lang/System",
            "getProperty",
            "(Ljava/lang/String;)Ljava/lang/String;",
            vec![JavaValue::from(key)],
        );
        match self.invoke(&operation)? {
            JavaValue::String(value) => Ok(Some(value)),
            JavaValue::Null => Ok(None),
            other => Err(self.translate(
                &operation,
                NativeFailure::new(StatusCode::Err, format!("unexpected result {}", other)),
            )),
        }
    }

    /// Describes the running VM as `[<vm name> (<vm vendor>)]`.
    pub fn vm_description(&self) -> BridgeResult<String> {
        let name = self.system_property("java.vm.name")?.unwrap_or_default();
        let vendor = self.system_property("java.vm.vendor")?.unwrap_or_default();
        Ok(format!("[{} ({})]", name, vendor))
    }

    fn translate(&self, operation: &dyn fmt::Display, failure: NativeFailure) -> BridgeError {
        BridgeError::Native(NativeError {
            kind: self.errors.resolve(failure.status),
            status: failure.status,
            operation: operation.to_string(),
            context: failure.context,
        })
    }

    fn startup_refused(&self, diagnostic: &str) -> BridgeError {
        BridgeError::Startup {
            status: StatusCode::Err,
            kind: self.errors.resolve(StatusCode::Err),
            diagnostic: diagnostic.to_string(),
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("backend", &self.backend.describe())
            .field("state", &self.state)
            .field("options", &self.options)
            .finish()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if matches!(self.state, LifecycleState::Running | LifecycleState::Failed) {
            if let Err(err) = self.shutdown() {
                log::warn!("shutdown during drop failed: {}", err);
            }
        }
    }
}
