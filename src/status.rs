//! JNI status codes and the error kinds they translate into.
//!
//! Every native call into the embedded JVM reports a `jint` status. The
//! [`StatusCode`] enum gives those values names, and [`ErrorKind`] is the
//! closed set of failure categories a caller can pattern-match on once a
//! status has gone through the [`ErrorMap`](crate::mapping::ErrorMap).

use jni_sys::{jint, JNI_EDETACHED, JNI_EEXIST, JNI_EINVAL, JNI_ENOMEM, JNI_ERR, JNI_EVERSION, JNI_OK};
use serde::Serialize;
use std::fmt;

// ============================================================================
// STATUS CODES
// ============================================================================

/// A status value returned by a JNI invocation-API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StatusCode {
    /// `JNI_OK`
    Ok,
    /// `JNI_ERR`: unknown error
    Err,
    /// `JNI_EDETACHED`: thread detached from the VM
    Detached,
    /// `JNI_EVERSION`: JNI version error
    Version,
    /// `JNI_ENOMEM`: not enough memory
    NoMem,
    /// `JNI_EEXIST`: VM already created
    Exist,
    /// `JNI_EINVAL`: invalid arguments
    Inval,
    /// Any value outside the documented set.
    Other(i32),
}

impl StatusCode {
    /// Every documented failure status, in JNI numeric order.
    pub const FAILURES: [StatusCode; 6] = [
        StatusCode::Err,
        StatusCode::Detached,
        StatusCode::Version,
        StatusCode::NoMem,
        StatusCode::Exist,
        StatusCode::Inval,
    ];

    pub fn from_raw(raw: jint) -> Self {
        match raw {
            JNI_OK => StatusCode::Ok,
            JNI_ERR => StatusCode::Err,
            JNI_EDETACHED => StatusCode::Detached,
            JNI_EVERSION => StatusCode::Version,
            JNI_ENOMEM => StatusCode::NoMem,
            JNI_EEXIST => StatusCode::Exist,
            JNI_EINVAL => StatusCode::Inval,
            other => StatusCode::Other(other),
        }
    }

    pub fn raw(self) -> jint {
        match self {
            StatusCode::Ok => JNI_OK,
            StatusCode::Err => JNI_ERR,
            StatusCode::Detached => JNI_EDETACHED,
            StatusCode::Version => JNI_EVERSION,
            StatusCode::NoMem => JNI_ENOMEM,
            StatusCode::Exist => JNI_EEXIST,
            StatusCode::Inval => JNI_EINVAL,
            StatusCode::Other(raw) => raw,
        }
    }

    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }

    /// The JNI constant name, or `"JNI_<raw>"` for undocumented values.
    pub fn name(self) -> String {
        match self {
            StatusCode::Ok => "JNI_OK".to_string(),
            StatusCode::Err => "JNI_ERR".to_string(),
            StatusCode::Detached => "JNI_EDETACHED".to_string(),
            StatusCode::Version => "JNI_EVERSION".to_string(),
            StatusCode::NoMem => "JNI_ENOMEM".to_string(),
            StatusCode::Exist => "JNI_EEXIST".to_string(),
            StatusCode::Inval => "JNI_EINVAL".to_string(),
            StatusCode::Other(raw) => format!("JNI_{}", raw),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.raw())
    }
}

// ============================================================================
// ERROR KINDS
// ============================================================================

/// Type-safe classification of a failed native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    /// Generic failure, and the fallback for unregistered status codes.
    Unknown,
    ThreadNotAttached,
    VersionNotSupported,
    NotEnoughMemory,
    /// A JVM already exists in this process.
    AlreadyExists,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unknown => "UnknownError",
            ErrorKind::ThreadNotAttached => "ThreadNotAttachedError",
            ErrorKind::VersionNotSupported => "VersionNotSupportedError",
            ErrorKind::NotEnoughMemory => "NotEnoughMemoryError",
            ErrorKind::AlreadyExists => "JVMAlreadyExistError",
            ErrorKind::InvalidArgument => "InvalidArgumentError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
