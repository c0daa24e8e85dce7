//! Built-in Revue CRUD suite
//!
//! The default run: create, list and capture, edit, delete, then the three
//! negative checks. `scenarios/revue_crud.yaml` is the file form of the same
//! suite with two extra verification lists.

use serde_json::json;

use crate::api::{messages, RevuePayload, NIL_REVUE_ID};

use super::config::{
    ListExpectation, ResponseExpectation, ScenarioStep, ScenarioSuite, StepAction, Target,
};

fn step(name: &str, description: &str, action: StepAction) -> ScenarioStep {
    ScenarioStep {
        name: name.to_string(),
        description: Some(description.to_string()),
        action,
    }
}

fn payload(title: &str, description: &str) -> serde_json::Value {
    json!(RevuePayload::new(title, description))
}

/// The default suite
pub fn builtin_suite() -> ScenarioSuite {
    ScenarioSuite {
        name: "Revue CRUD".to_string(),
        description: Some(
            "Create, list, edit and delete a revue, then check invalid input and unknown ids"
                .to_string(),
        ),
        steps: vec![
            step(
                "create_revue",
                "Create a revue with all fields",
                StepAction::Create {
                    payload: payload("Exam Test Revue", "This is created during exam"),
                    expect: ResponseExpectation::message(200, messages::CREATED),
                },
            ),
            step(
                "list_revues",
                "List revues and capture the last id",
                StepAction::List {
                    capture: true,
                    expect: ListExpectation {
                        non_empty: true,
                        ..ListExpectation::default()
                    },
                },
            ),
            step(
                "edit_revue",
                "Edit the captured revue",
                StepAction::Edit {
                    target: Target::Captured,
                    payload: payload("Edited Title", "Edited description"),
                    expect: ResponseExpectation::message(200, messages::EDITED),
                },
            ),
            step(
                "delete_revue",
                "Delete the captured revue",
                StepAction::Delete {
                    target: Target::Captured,
                    expect: ResponseExpectation::message(200, messages::DELETED),
                },
            ),
            step(
                "create_revue_missing_fields",
                "Create with empty title and description",
                StepAction::Create {
                    payload: json!({ "title": "", "description": "" }),
                    expect: ResponseExpectation::status(400),
                },
            ),
            step(
                "edit_nonexistent_revue",
                "Edit an id that does not exist",
                StepAction::Edit {
                    target: Target::Id(NIL_REVUE_ID.to_string()),
                    payload: payload("Non-existing", "Invalid"),
                    expect: ResponseExpectation::message(400, messages::NO_SUCH_REVUE),
                },
            ),
            step(
                "delete_nonexistent_revue",
                "Delete an id that does not exist",
                StepAction::Delete {
                    target: Target::Id(NIL_REVUE_ID.to_string()),
                    expect: ResponseExpectation::message(400, messages::NO_SUCH_REVUE),
                },
            ),
        ],
    }
}
