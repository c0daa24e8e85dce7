//! Error types for revue-check
//!
//! Setup failures (authentication) are fatal for a run; everything a step
//! observes about the API is reported through `TestAssertion` instead.

use std::io;
use thiserror::Error;

use crate::scenario::Fact;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for revue-check
#[derive(Error, Debug)]
pub enum Error {
    // === Transport Errors ===
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // === Session Errors ===
    #[error("Authentication failed with status {status}: {body}")]
    AuthenticationFailed { status: u16, body: String },

    #[error("Authentication response did not contain an access token")]
    MissingToken,

    #[error("Not authenticated. Call authenticate() before issuing Revue requests")]
    NotAuthenticated,

    // === Response Errors ===
    #[error("Unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse { endpoint: String, reason: String },

    // === Scenario Errors ===
    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    #[error("Step '{step}' needs {fact}, which no successful earlier step produced")]
    MissingState { step: String, fact: Fact },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Scenario File Errors ===
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an unexpected response error for an endpoint
    pub fn unexpected_response(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an assertion error
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::TestAssertion(message.into())
    }

    /// Whether this error must abort the whole run rather than one step
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::AuthenticationFailed { .. } | Error::MissingToken | Error::NotAuthenticated
        )
    }
}
