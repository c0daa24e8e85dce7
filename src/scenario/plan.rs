//! Dependency-ordered step plans
//!
//! Every step's produced and consumed state is derived from its action.
//! A plan is valid when, walking the steps in declared order, each consumed
//! fact has been produced by an earlier step and not revoked since.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::common::{Error, Result};

use super::config::{ScenarioStep, StepAction, Target};

/// Session state a step can produce or require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fact {
    /// At least one revue was created in this run
    RevueCreated,
    /// A list step captured an id
    RevueId,
    /// The captured revue was edited since it was captured
    RevueEdited,
    /// A delete removed a known id
    RevueDeleted,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Fact::RevueCreated => "a created revue",
            Fact::RevueId => "a captured revue id",
            Fact::RevueEdited => "an edit of the captured revue",
            Fact::RevueDeleted => "a deleted revue id",
        };
        f.write_str(name)
    }
}

/// What a step consumes, produces and invalidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub consumes: Vec<Fact>,
    pub produces: Vec<Fact>,
    pub revokes: Vec<Fact>,
}

impl StepAction {
    /// Derive this action's dependencies
    pub fn dependencies(&self) -> Dependencies {
        let mut deps = Dependencies::default();

        match self {
            StepAction::Create { expect, .. } => {
                if expect.expects_success() {
                    deps.produces.push(Fact::RevueCreated);
                }
            }
            StepAction::List { capture, expect } => {
                if *capture {
                    deps.consumes.push(Fact::RevueCreated);
                    deps.revokes.push(Fact::RevueEdited);
                    deps.produces.push(Fact::RevueId);
                }
                if expect.captured_title.is_some() {
                    deps.consumes.push(Fact::RevueId);
                    deps.consumes.push(Fact::RevueEdited);
                }
                if expect.excludes_deleted {
                    deps.consumes.push(Fact::RevueDeleted);
                }
            }
            StepAction::Edit { target, expect, .. } => {
                if *target == Target::Captured {
                    deps.consumes.push(Fact::RevueId);
                    if expect.expects_success() {
                        deps.produces.push(Fact::RevueEdited);
                    }
                }
            }
            StepAction::Delete { target, expect } => {
                if *target == Target::Captured {
                    deps.consumes.push(Fact::RevueId);
                    if expect.expects_success() {
                        deps.revokes.push(Fact::RevueId);
                        deps.revokes.push(Fact::RevueEdited);
                        deps.produces.push(Fact::RevueDeleted);
                    }
                }
            }
        }

        deps.consumes.dedup();
        deps
    }
}

/// A validated, ordered list of steps
#[derive(Debug, Clone)]
pub struct Plan {
    steps: Vec<ScenarioStep>,
    /// For each step, the index of the step providing each consumed fact
    providers: Vec<BTreeMap<Fact, usize>>,
}

impl Plan {
    /// Validate `steps` in declared order
    pub fn new(steps: Vec<ScenarioStep>) -> Result<Self> {
        let mut names = HashSet::new();
        for step in &steps {
            if step.name.trim().is_empty() {
                return Err(Error::Config("Scenario step with empty name".to_string()));
            }
            if !names.insert(step.name.as_str()) {
                return Err(Error::Config(format!(
                    "Duplicate scenario step name '{}'",
                    step.name
                )));
            }
            if let StepAction::List {
                capture: true,
                expect,
            } = &step.action
            {
                if !(200..300).contains(&expect.status) {
                    return Err(Error::Config(format!(
                        "Step '{}' captures an id but expects status {}",
                        step.name, expect.status
                    )));
                }
            }
        }

        let mut available: HashMap<Fact, usize> = HashMap::new();
        let mut providers = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let deps = step.action.dependencies();
            let mut provided_by = BTreeMap::new();

            for fact in &deps.consumes {
                match available.get(fact) {
                    Some(&provider) => {
                        provided_by.insert(*fact, provider);
                    }
                    None => {
                        return Err(Error::Config(format!(
                            "Step '{}' needs {}, but no earlier step produces it",
                            step.name, fact
                        )));
                    }
                }
            }

            for fact in &deps.revokes {
                available.remove(fact);
            }
            for fact in deps.produces {
                available.insert(fact, index);
            }
            providers.push(provided_by);
        }

        Ok(Self { steps, providers })
    }

    /// Narrow the plan to `names` plus every step they transitively depend on
    ///
    /// Declared order is preserved. An empty selection keeps the whole plan.
    pub fn select(&self, names: &[String]) -> Result<Plan> {
        if names.is_empty() {
            return Ok(self.clone());
        }

        let mut pending = Vec::new();
        for name in names {
            let index = self
                .steps
                .iter()
                .position(|s| &s.name == name)
                .ok_or_else(|| {
                    let available: Vec<&str> = self.steps.iter().map(|s| s.name.as_str()).collect();
                    Error::Config(format!(
                        "Unknown step '{}'. Available: {:?}",
                        name, available
                    ))
                })?;
            pending.push(index);
        }

        let mut selected = BTreeSet::new();
        while let Some(index) = pending.pop() {
            if selected.insert(index) {
                pending.extend(self.providers[index].values().copied());
            }
        }

        let steps = selected
            .into_iter()
            .map(|i| self.steps[i].clone())
            .collect();
        Plan::new(steps)
    }

    pub fn steps(&self) -> &[ScenarioStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the steps that provide what step `index` consumes
    pub fn providers_of(&self, index: usize) -> Vec<&str> {
        let Some(providers) = self.providers.get(index) else {
            return Vec::new();
        };
        let indices: BTreeSet<usize> = providers.values().copied().collect();
        indices
            .into_iter()
            .map(|i| self.steps[i].name.as_str())
            .collect()
    }

    /// Facts step `index` consumes whose providing step is not in `passed`
    pub fn unmet(&self, index: usize, passed: &BTreeSet<usize>) -> Vec<Fact> {
        self.providers
            .get(index)
            .map(|providers| {
                providers
                    .iter()
                    .filter(|(_, provider)| !passed.contains(*provider))
                    .map(|(fact, _)| *fact)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::builtin::builtin_suite;
    use crate::scenario::config::{ListExpectation, ResponseExpectation};
    use serde_json::json;

    fn step(name: &str, action: StepAction) -> ScenarioStep {
        ScenarioStep {
            name: name.to_string(),
            description: None,
            action,
        }
    }

    fn create(status: u16) -> StepAction {
        StepAction::Create {
            payload: json!({ "title": "t", "description": "d", "url": "" }),
            expect: ResponseExpectation::status(status),
        }
    }

    fn capture() -> StepAction {
        StepAction::List {
            capture: true,
            expect: ListExpectation::default(),
        }
    }

    fn edit(status: u16) -> StepAction {
        StepAction::Edit {
            target: Target::Captured,
            payload: json!({ "title": "Edited Title", "description": "d", "url": "" }),
            expect: ResponseExpectation::status(status),
        }
    }

    fn delete(target: Target, status: u16) -> StepAction {
        StepAction::Delete {
            target,
            expect: ResponseExpectation::status(status),
        }
    }

    fn names(plan: &Plan) -> Vec<&str> {
        plan.steps().iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_builtin_suite_is_valid() {
        let plan = Plan::new(builtin_suite().steps).unwrap();
        assert_eq!(plan.len(), 7);
        assert_eq!(plan.providers_of(2), vec!["list_revues"]);
        assert_eq!(plan.providers_of(1), vec!["create_revue"]);
        assert!(plan.providers_of(4).is_empty());
    }

    #[test]
    fn test_consume_before_produce_rejected() {
        let err = Plan::new(vec![
            step("delete", delete(Target::Captured, 200)),
            step("create", create(200)),
        ])
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("'delete'"), "{}", msg);
        assert!(msg.contains("captured revue id"), "{}", msg);
    }

    #[test]
    fn test_failed_create_produces_nothing() {
        let err = Plan::new(vec![
            step("create_invalid", create(400)),
            step("list", capture()),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("created revue"));
    }

    #[test]
    fn test_delete_revokes_captured_id() {
        let err = Plan::new(vec![
            step("create", create(200)),
            step("list", capture()),
            step("delete", delete(Target::Captured, 200)),
            step("delete_again", delete(Target::Captured, 400)),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("'delete_again'"));

        // Literal ids need no captured state
        Plan::new(vec![
            step("create", create(200)),
            step("list", capture()),
            step("delete", delete(Target::Captured, 200)),
            step("delete_nil", delete(Target::Id("0".to_string()), 400)),
        ])
        .unwrap();
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        assert!(Plan::new(vec![step("a", create(200)), step("a", create(200))]).is_err());
        assert!(Plan::new(vec![step(" ", create(200))]).is_err());
    }

    #[test]
    fn test_select_pulls_in_producers() {
        let plan = Plan::new(builtin_suite().steps).unwrap();

        let only_edit = plan.select(&["edit_revue".to_string()]).unwrap();
        assert_eq!(
            names(&only_edit),
            vec!["create_revue", "list_revues", "edit_revue"]
        );

        let negative = plan
            .select(&["delete_nonexistent_revue".to_string()])
            .unwrap();
        assert_eq!(names(&negative), vec!["delete_nonexistent_revue"]);

        let all = plan.select(&[]).unwrap();
        assert_eq!(all.len(), plan.len());
    }

    #[test]
    fn test_select_unknown_step() {
        let plan = Plan::new(builtin_suite().steps).unwrap();
        let err = plan.select(&["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Unknown step 'nope'"));
    }

    #[test]
    fn test_list_checks_consume_state() {
        let deps = StepAction::List {
            capture: false,
            expect: ListExpectation {
                captured_title: Some("Edited Title".to_string()),
                excludes_deleted: true,
                ..ListExpectation::default()
            },
        }
        .dependencies();

        assert_eq!(
            deps.consumes,
            vec![Fact::RevueId, Fact::RevueEdited, Fact::RevueDeleted]
        );
        assert!(deps.produces.is_empty());
    }

    #[test]
    fn test_select_title_check_pulls_in_edit() {
        let plan = Plan::new(vec![
            step("create", create(200)),
            step("list", capture()),
            step("edit", edit(200)),
            step(
                "verify_edit",
                StepAction::List {
                    capture: false,
                    expect: ListExpectation {
                        captured_title: Some("Edited Title".to_string()),
                        ..ListExpectation::default()
                    },
                },
            ),
        ])
        .unwrap();

        let selected = plan.select(&["verify_edit".to_string()]).unwrap();
        assert_eq!(names(&selected), vec!["create", "list", "edit", "verify_edit"]);
        assert_eq!(plan.providers_of(3), vec!["list", "edit"]);
    }

    #[test]
    fn test_new_capture_revokes_edit() {
        let err = Plan::new(vec![
            step("create", create(200)),
            step("list", capture()),
            step("edit", edit(200)),
            step("list_again", capture()),
            step(
                "verify_edit",
                StepAction::List {
                    capture: false,
                    expect: ListExpectation {
                        captured_title: Some("Edited Title".to_string()),
                        ..ListExpectation::default()
                    },
                },
            ),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("edit of the captured revue"));
    }

    #[test]
    fn test_capture_with_error_status_rejected() {
        let err = Plan::new(vec![
            step("create", create(200)),
            step(
                "list",
                StepAction::List {
                    capture: true,
                    expect: ListExpectation {
                        status: 401,
                        ..ListExpectation::default()
                    },
                },
            ),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("captures an id but expects status 401"));
    }

    #[test]
    fn test_unmet_names_facts_of_failed_providers() {
        let plan = Plan::new(vec![
            step("create_a", create(200)),
            step("list_a", capture()),
            step("create_b", create(200)),
            step("list_b", capture()),
            step("delete_b", delete(Target::Captured, 200)),
        ])
        .unwrap();

        assert_eq!(plan.providers_of(3), vec!["create_b"]);
        assert_eq!(plan.providers_of(4), vec!["list_b"]);

        let passed: BTreeSet<usize> = [0, 1].into_iter().collect();
        assert_eq!(plan.unmet(3, &passed), vec![Fact::RevueCreated]);
        assert_eq!(plan.unmet(4, &passed), vec![Fact::RevueId]);
        assert!(plan.unmet(1, &passed).is_empty());
    }
}
