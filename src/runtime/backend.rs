//! The seam between the runtime handle and the native JVM.
//!
//! [`Runtime`](super::Runtime) owns lifecycle state, thread bookkeeping and
//! error translation; a [`NativeBackend`] only performs raw native work and
//! reports failures as a [`NativeFailure`] (an untranslated status plus
//! diagnostic text). The production implementation is
//! [`JniBackend`](super::jni::JniBackend).

use super::value::{JavaValue, Operation};
use crate::status::StatusCode;
use std::fmt;

/// An untranslated native failure: the raw status and what the native side
/// said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFailure {
    pub status: StatusCode,
    pub context: String,
}

impl NativeFailure {
    pub fn new(status: StatusCode, context: impl Into<String>) -> Self {
        Self {
            status,
            context: context.into(),
        }
    }
}

impl fmt::Display for NativeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.context)
    }
}

/// Raw access to one embedded JVM.
///
/// `create` and `destroy` are only ever called through `&mut` from the
/// owning [`Runtime`](super::Runtime); the `&self` methods may be called from
/// any thread the runtime has recorded as attached.
pub trait NativeBackend: Send + Sync {
    /// Loads whatever is needed and creates the VM with verbatim options.
    /// The calling thread is attached to the new VM on success.
    fn create(&mut self, options: &[String]) -> Result<(), NativeFailure>;

    /// Performs one operation on the calling thread.
    fn call(&self, operation: &Operation) -> Result<JavaValue, NativeFailure>;

    fn attach_current_thread(&self) -> Result<(), NativeFailure>;

    fn detach_current_thread(&self) -> Result<(), NativeFailure>;

    /// Releases everything `create` acquired, including after a failed
    /// `create`. Called at most once per backend.
    fn destroy(&mut self) -> Result<(), NativeFailure>;

    /// Short human-readable label used in logs.
    fn describe(&self) -> String {
        "native backend".to_string()
    }
}
