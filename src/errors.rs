//! Error types for the JVM bridge.
//!
//! All bridge failures are [`BridgeError`] values carrying `miette`
//! diagnostic codes. Native call failures are never surfaced as raw numbers:
//! they arrive as [`NativeError`] with the resolved [`ErrorKind`] next to the
//! original [`StatusCode`], so callers match on the kind and still have the
//! code for reporting.

use crate::status::{ErrorKind, StatusCode};
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

// ============================================================================
// NATIVE CALL FAILURES
// ============================================================================

/// A failed native call, translated through the error map.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq)]
#[error("{kind}: {operation} failed with {status}: {context}")]
#[diagnostic(code(jt::native))]
pub struct NativeError {
    pub kind: ErrorKind,
    pub status: StatusCode,
    /// The operation that was being performed, e.g. `java/lang/Math.abs(I)I`.
    pub operation: String,
    /// Native diagnostic text, including any Java exception description.
    pub context: String,
}

// ============================================================================
// LOCATION FAILURES
// ============================================================================

/// No usable JVM shared library was found.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("no JVM shared library ({library}) found; probed {} location(s){}", .probed.len(), render_probed(.probed))]
#[diagnostic(
    code(jt::locate),
    help("set JAVA_HOME, put `java` on PATH, or pass --jvm / JT_JVM_PATH with the library path")
)]
pub struct LocationError {
    pub library: String,
    pub probed: Vec<PathBuf>,
}

fn render_probed(probed: &[PathBuf]) -> String {
    probed
        .iter()
        .map(|p| format!("\n  - {}", p.display()))
        .collect()
}

// ============================================================================
// BRIDGE ERRORS
// ============================================================================

/// Unified error type for every runtime lifecycle and call failure.
#[derive(Debug, Error, Diagnostic)]
pub enum BridgeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Location(#[from] LocationError),

    #[error("the embedded JVM is already running")]
    #[diagnostic(
        code(jt::runtime::already_running),
        help("a runtime handle can only be started once")
    )]
    AlreadyRunning,

    #[error("failed to start the embedded JVM ({kind}, {status}): {diagnostic}")]
    #[diagnostic(
        code(jt::runtime::startup),
        help(
            "the JVM writes its own reason for rejecting startup (such as an unrecognized \
             option) directly to standard error, above this report; it is not captured here"
        )
    )]
    Startup {
        status: StatusCode,
        kind: ErrorKind,
        diagnostic: String,
    },

    #[error("the embedded JVM is not running")]
    #[diagnostic(
        code(jt::runtime::not_running),
        help("start the runtime before invoking operations; a shut down runtime cannot be reused")
    )]
    NotRunning,

    #[error("failed to shut down the embedded JVM ({kind}, {status}): {diagnostic}")]
    #[diagnostic(code(jt::runtime::shutdown))]
    Shutdown {
        status: StatusCode,
        kind: ErrorKind,
        diagnostic: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Native(#[from] NativeError),
}

impl BridgeError {
    /// The translated kind, for errors that came from a native status.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            BridgeError::Startup { kind, .. } => Some(*kind),
            BridgeError::Shutdown { kind, .. } => Some(*kind),
            BridgeError::Native(native) => Some(native.kind),
            _ => None,
        }
    }

    /// The originating status code, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BridgeError::Startup { status, .. } => Some(*status),
            BridgeError::Shutdown { status, .. } => Some(*status),
            BridgeError::Native(native) => Some(native.status),
            _ => None,
        }
    }
}
