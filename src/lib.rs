//! revue-check - scenario runner for the Revue CRUD REST API
//!
//! This library provides a typed API client, a dependency-ordered scenario
//! runner that threads session state between steps, and an in-memory mock
//! of the API for offline runs and tests.

pub mod api;
pub mod cli;
pub mod commands;
pub mod common;
pub mod mock;
pub mod scenario;

// Re-export commonly used types for tests
pub use api::RevueClient;
pub use common::{Error, Result};
pub use scenario::{run_suite, RunOptions, ScenarioSuite, SessionContext};
