//! Scenario runner
//!
//! Runs an ordered suite of single-call steps against the Revue API,
//! threading the session and captured ids through an explicit
//! [`SessionContext`]. Suites come from YAML files or the built-in suite.

mod builtin;
mod config;
mod context;
mod plan;
mod runner;

pub use builtin::builtin_suite;
pub use config::*;
pub use context::SessionContext;
pub use plan::{Dependencies, Fact, Plan};
pub use runner::{load_suite, run_plan, run_suite, RunOptions, StepResult, StepStatus, TestResult};
