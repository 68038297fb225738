//! Built-in test modules.
//!
//! | module      | covers                                                  |
//! |-------------|---------------------------------------------------------|
//! | `lifecycle` | running state, VM identity, startup options, threads    |
//! | `statics`   | static calls and field reads for every result type      |
//! | `failures`  | translation of native and Java failures                 |
//! | `fixtures`  | the compiled `org.python.Version` fixture                |

use super::TestModule;

pub mod failures;
pub mod fixtures;
pub mod lifecycle;
pub mod statics;

/// Every built-in module, in the order a full run executes them.
pub fn all() -> Vec<TestModule> {
    vec![
        lifecycle::module(),
        statics::module(),
        failures::module(),
        fixtures::module(),
    ]
}
