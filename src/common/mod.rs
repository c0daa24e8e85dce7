//! Common utilities shared by the client, runner and mock server

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
