//! Scenario suite configuration types
//!
//! Defines the data structures for deserializing YAML scenario suites.

use serde::Deserialize;
use serde_json::Value;

/// A complete scenario suite loaded from a YAML file
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioSuite {
    /// Name of the suite
    pub name: String,
    /// Optional description of what the suite verifies
    pub description: Option<String>,
    /// Steps in dependency order
    pub steps: Vec<ScenarioStep>,
}

/// One step: a single API call plus its assertions
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioStep {
    /// Unique step name, used by `--only` and in reports
    pub name: String,
    /// Optional human-readable description
    pub description: Option<String>,
    /// What the step does
    #[serde(flatten)]
    pub action: StepAction,
}

/// The API call a step performs
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// `POST /Revue/Create`
    Create {
        /// Free-form JSON so negative cases can omit fields
        payload: Value,
        expect: ResponseExpectation,
    },
    /// `GET /Revue/All`
    List {
        /// Capture the id of the last record for later steps
        #[serde(default)]
        capture: bool,
        #[serde(default)]
        expect: ListExpectation,
    },
    /// `PUT /Revue/Edit?revueId=...`
    Edit {
        #[serde(default)]
        target: Target,
        payload: Value,
        expect: ResponseExpectation,
    },
    /// `DELETE /Revue/Delete?revueId=...`
    Delete {
        #[serde(default)]
        target: Target,
        expect: ResponseExpectation,
    },
}

impl StepAction {
    /// Short label for reports
    pub fn label(&self) -> &'static str {
        match self {
            StepAction::Create { .. } => "create",
            StepAction::List { .. } => "list",
            StepAction::Edit { .. } => "edit",
            StepAction::Delete { .. } => "delete",
        }
    }
}

/// Which revue an edit or delete addresses
///
/// In YAML, `captured` means the id captured by the last list step; any
/// other string is used as a literal id.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(from = "String")]
pub enum Target {
    #[default]
    Captured,
    Id(String),
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        if value == "captured" {
            Target::Captured
        } else {
            Target::Id(value)
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Captured => write!(f, "captured id"),
            Target::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Expected status and, optionally, the exact `msg` of the body
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResponseExpectation {
    pub status: u16,
    /// Exact `msg` field; when absent the body is not inspected
    pub msg: Option<String>,
}

impl ResponseExpectation {
    pub fn status(status: u16) -> Self {
        Self { status, msg: None }
    }

    pub fn message(status: u16, msg: &str) -> Self {
        Self {
            status,
            msg: Some(msg.to_string()),
        }
    }

    /// Whether this expectation describes a successful call
    pub fn expects_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Expectations for a list step
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListExpectation {
    #[serde(default = "default_list_status")]
    pub status: u16,
    /// At least one record must be returned
    #[serde(default)]
    pub non_empty: bool,
    /// The record with the currently captured id must carry this title
    pub captured_title: Option<String>,
    /// The id removed by the last successful delete must not be listed
    #[serde(default)]
    pub excludes_deleted: bool,
}

impl Default for ListExpectation {
    fn default() -> Self {
        Self {
            status: default_list_status(),
            non_empty: false,
            captured_title: None,
            excludes_deleted: false,
        }
    }
}

fn default_list_status() -> u16 {
    200
}
