//! Scenario runner implementation
//!
//! Executes a plan step by step against the API, asserting on status codes
//! and typed payloads rather than on raw body text.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use colored::Colorize;
use serde_json::Value;

use crate::api::{ApiResponse, RevueClient, RevueRecord};
use crate::common::config::Config;
use crate::common::{Error, Result};

use super::config::{
    ListExpectation, ResponseExpectation, ScenarioStep, ScenarioSuite, StepAction, Target,
};
use super::context::SessionContext;
use super::plan::{Fact, Plan};

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Passed,
    Failed(String),
    /// Not run because an earlier producer did not succeed
    Skipped(Vec<Fact>),
}

/// Result of one step
#[derive(Debug, Clone)]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
}

impl StepResult {
    pub fn passed(&self) -> bool {
        self.status == StepStatus::Passed
    }
}

/// Result of a suite run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub steps: Vec<StepResult>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepResult::passed)
    }

    pub fn passed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Skipped(_)))
            .count()
    }

    /// Look up a step result by name
    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Options for a suite run
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    /// Restrict the run to these steps and their producers
    pub only: Vec<String>,
    /// Print request details
    pub verbose: bool,
}

/// Load a scenario suite from a YAML file
pub fn load_suite(path: &Path) -> Result<ScenarioSuite> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let suite: ScenarioSuite = serde_yaml::from_str(&content)?;
    Ok(suite)
}

/// Run a suite against the API described by `config`
///
/// Returns `Err` only for fatal problems: an invalid plan, an invalid base
/// URL, or a failed authentication. Step failures are reported in the result.
pub async fn run_suite(
    suite: &ScenarioSuite,
    config: &Config,
    options: &RunOptions,
) -> Result<TestResult> {
    let plan = Plan::new(suite.steps.clone())?.select(&options.only)?;

    println!(
        "\n{} {}",
        "Running Suite:".blue().bold(),
        suite.name.white().bold()
    );
    if let Some(desc) = &suite.description {
        println!("  {}", desc.dimmed());
    }
    if options.verbose {
        println!("  Target: {}", config.api.base_url.dimmed());
    }

    let client = RevueClient::from_config(config)?;
    let mut ctx = SessionContext::new(
        client,
        config.credentials.clone(),
        config.scenario.reauthenticate,
    );

    let result = run_plan(&suite.name, &plan, &mut ctx, options.verbose).await;
    ctx.close();
    let result = result?;

    print_summary(&result);
    Ok(result)
}

/// Run a validated plan with an existing session context
pub async fn run_plan(
    name: &str,
    plan: &Plan,
    ctx: &mut SessionContext,
    verbose: bool,
) -> Result<TestResult> {
    println!("\n{}", "Steps:".cyan());

    let mut steps = Vec::with_capacity(plan.len());
    let mut passed = BTreeSet::new();

    for (i, step) in plan.steps().iter().enumerate() {
        let step_num = i + 1;
        let deps = step.action.dependencies();

        // A value left over from an earlier chain does not stand in for a failed provider
        let mut missing = plan.unmet(i, &passed);
        for fact in ctx.missing(&deps.consumes) {
            if !missing.contains(&fact) {
                missing.push(fact);
            }
        }
        missing.sort();
        if !missing.is_empty() {
            println!(
                "  {} Step {}: {} (skipped, needs {})",
                "-".yellow(),
                step_num,
                step.name.dimmed(),
                FactList(&missing)
            );
            tracing::warn!(step = %step.name, "Skipped: missing {}", FactList(&missing));
            steps.push(StepResult {
                name: step.name.clone(),
                status: StepStatus::Skipped(missing),
            });
            continue;
        }

        if let Err(e) = ctx.ensure_authenticated().await {
            println!("  {} Step {}: authentication failed: {}", "✗".red(), step_num, e);
            tracing::error!("Authentication failed, aborting run: {}", e);
            return Err(e);
        }

        match execute_step(ctx, step, step_num, verbose).await {
            Ok(()) => {
                passed.insert(i);
                steps.push(StepResult {
                    name: step.name.clone(),
                    status: StepStatus::Passed,
                });
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                println!("  {} Step {}: {}: {}", "✗".red(), step_num, step.name, e);
                tracing::warn!(step = %step.name, "Step failed: {}", e);
                steps.push(StepResult {
                    name: step.name.clone(),
                    status: StepStatus::Failed(e.to_string()),
                });
            }
        }
    }

    Ok(TestResult {
        name: name.to_string(),
        steps,
    })
}

/// Execute a single step
async fn execute_step(
    ctx: &mut SessionContext,
    step: &ScenarioStep,
    step_num: usize,
    verbose: bool,
) -> Result<()> {
    tracing::info!(step = %step.name, action = step.action.label(), "Running step");

    match &step.action {
        StepAction::Create { payload, expect } => {
            execute_create_step(ctx, step, payload, expect, step_num, verbose).await
        }
        StepAction::List { capture, expect } => {
            execute_list_step(ctx, step, *capture, expect, step_num, verbose).await
        }
        StepAction::Edit {
            target,
            payload,
            expect,
        } => execute_edit_step(ctx, step, target, payload, expect, step_num, verbose).await,
        StepAction::Delete { target, expect } => {
            execute_delete_step(ctx, step, target, expect, step_num, verbose).await
        }
    }
}

/// Execute a create step
async fn execute_create_step(
    ctx: &mut SessionContext,
    step: &ScenarioStep,
    payload: &Value,
    expect: &ResponseExpectation,
    step_num: usize,
    verbose: bool,
) -> Result<()> {
    if verbose {
        println!("    payload: {}", payload.to_string().dimmed());
    }

    let response = ctx.client().create(payload).await?;
    check_response(&response, expect)?;

    if expect.expects_success() {
        ctx.record_created();
    }

    print_passed(step_num, &step.name, &response);
    Ok(())
}

/// Execute a list step
async fn execute_list_step(
    ctx: &mut SessionContext,
    step: &ScenarioStep,
    capture: bool,
    expect: &ListExpectation,
    step_num: usize,
    _verbose: bool,
) -> Result<()> {
    let response = ctx.client().list().await?;
    check_status(&response, expect.status)?;

    if !(200..300).contains(&expect.status) {
        print_passed(step_num, &step.name, &response);
        return Ok(());
    }

    let records: Vec<RevueRecord> = response.json()?;

    if expect.non_empty && records.is_empty() {
        return Err(Error::assertion("Expected a non-empty list of revues, got none"));
    }

    if let Some(expected_title) = &expect.captured_title {
        let id = ctx.resolve(&step.name, &Target::Captured)?;
        let record = records.iter().find(|r| r.id == id).ok_or_else(|| {
            Error::assertion(format!("Captured revue '{}' is not in the list", id))
        })?;
        let actual = record.title.as_deref().unwrap_or("");
        if actual != expected_title {
            return Err(Error::assertion(format!(
                "Revue '{}': expected title '{}', got '{}'",
                id, expected_title, actual
            )));
        }
    }

    if expect.excludes_deleted {
        let deleted = ctx.deleted_id().ok_or_else(|| Error::MissingState {
            step: step.name.clone(),
            fact: Fact::RevueDeleted,
        })?;
        if records.iter().any(|r| r.id == deleted) {
            return Err(Error::assertion(format!(
                "Deleted revue '{}' is still listed",
                deleted
            )));
        }
    }

    let captured = if capture {
        let last = records
            .last()
            .ok_or_else(|| Error::assertion("Nothing to capture: the list is empty"))?;
        Some(last.id.clone())
    } else {
        None
    };

    println!(
        "  {} Step {}: {} ({} revues{})",
        "✓".green(),
        step_num,
        step.name.dimmed(),
        records.len(),
        captured
            .as_deref()
            .map(|id| format!(", captured {}", id))
            .unwrap_or_default()
            .dimmed()
    );

    if let Some(id) = captured {
        ctx.capture(id);
    }

    Ok(())
}

/// Execute an edit step
async fn execute_edit_step(
    ctx: &mut SessionContext,
    step: &ScenarioStep,
    target: &Target,
    payload: &Value,
    expect: &ResponseExpectation,
    step_num: usize,
    verbose: bool,
) -> Result<()> {
    let id = ctx.resolve(&step.name, target)?;
    if verbose {
        println!("    revueId: {}", id.dimmed());
        println!("    payload: {}", payload.to_string().dimmed());
    }

    let response = ctx.client().edit(&id, payload).await?;
    check_response(&response, expect)?;

    if expect.expects_success() {
        ctx.record_edited(&id);
    }

    print_passed(step_num, &step.name, &response);
    Ok(())
}

/// Execute a delete step
async fn execute_delete_step(
    ctx: &mut SessionContext,
    step: &ScenarioStep,
    target: &Target,
    expect: &ResponseExpectation,
    step_num: usize,
    verbose: bool,
) -> Result<()> {
    let id = ctx.resolve(&step.name, target)?;
    if verbose {
        println!("    revueId: {}", id.dimmed());
    }

    let response = ctx.client().delete(&id).await?;
    check_response(&response, expect)?;

    if expect.expects_success() {
        ctx.record_deleted(id);
    }

    print_passed(step_num, &step.name, &response);
    Ok(())
}

/// Check status and, when expected, the exact `msg`
fn check_response(response: &ApiResponse, expect: &ResponseExpectation) -> Result<()> {
    check_status(response, expect.status)?;

    if let Some(expected_msg) = &expect.msg {
        let actual = response.message()?;
        if &actual != expected_msg {
            return Err(Error::assertion(format!(
                "{}: expected msg '{}', got '{}'",
                response.endpoint, expected_msg, actual
            )));
        }
    }

    Ok(())
}

fn check_status(response: &ApiResponse, expected: u16) -> Result<()> {
    let actual = response.status_code();
    if actual != expected {
        return Err(Error::assertion(format!(
            "{}: expected status {}, got {} ({})",
            response.endpoint,
            expected,
            actual,
            crate::api::truncate_body(&response.body)
        )));
    }
    Ok(())
}

fn print_passed(step_num: usize, name: &str, response: &ApiResponse) {
    let detail = response
        .message()
        .map(|msg| format!("{} {}", response.status_code(), msg))
        .unwrap_or_else(|_| response.status_code().to_string());

    println!(
        "  {} Step {}: {} ({})",
        "✓".green(),
        step_num,
        name.dimmed(),
        detail.dimmed()
    );
}

fn print_summary(result: &TestResult) {
    let total = result.steps.len();
    if result.passed() {
        println!(
            "\n{} {}\n",
            "✓".green().bold(),
            format!("All {} steps passed", total).green().bold()
        );
    } else {
        println!(
            "\n{} {}\n",
            "✗".red().bold(),
            format!(
                "{} passed, {} failed, {} skipped (of {})",
                result.passed_count(),
                result.failed_count(),
                result.skipped_count(),
                total
            )
            .red()
            .bold()
        );
    }
}

/// Comma-separated facts for messages
struct FactList<'a>(&'a [Fact]);

impl fmt::Display for FactList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fact) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", fact)?;
        }
        Ok(())
    }
}
