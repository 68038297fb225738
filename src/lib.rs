//! jt-jvm: embeds a Java Virtual Machine through the JNI invocation API and
//! drives a suite of bridge tests against it.

pub use crate::errors::{BridgeError, BridgeResult, LocationError, NativeError};
pub use crate::mapping::ErrorMap;
pub use crate::runtime::{JavaValue, LifecycleState, Operation, Runtime};
pub use crate::status::{ErrorKind, StatusCode};

pub mod cli;
pub mod config;
pub mod errors;
pub mod fixtures;
pub mod locator;
pub mod mapping;
pub mod options;
pub mod runtime;
pub mod status;
pub mod suite;
