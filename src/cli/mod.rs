//! CLI command handling
//!
//! Resolves configuration, dispatches commands and formats output.

use std::path::Path;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::mock::MockServer;
use crate::scenario::{self, Plan, RunOptions, ScenarioSuite};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Run {
            scenario,
            base_url,
            email,
            password,
            only,
            auth_once,
            verbose,
        } => {
            if let Some(url) = base_url {
                config.api.base_url = url;
            }
            if let Some(email) = email {
                config.credentials.email = email;
            }
            if let Some(password) = password {
                config.credentials.password = password;
            }
            if auth_once {
                config.scenario.reauthenticate = false;
            }

            let suite = load_suite_or_builtin(scenario.as_deref())?;
            let options = RunOptions { only, verbose };
            let result = scenario::run_suite(&suite, &config, &options).await?;

            if result.passed() {
                Ok(())
            } else {
                Err(Error::assertion(format!(
                    "{} of {} steps did not pass",
                    result.steps.len() - result.passed_count(),
                    result.steps.len()
                )))
            }
        }

        Commands::Plan { scenario } => {
            let suite = load_suite_or_builtin(scenario.as_deref())?;
            let plan = Plan::new(suite.steps.clone())?;
            print_plan(&suite, &plan);
            Ok(())
        }

        Commands::Mock { listen } => {
            let listen = listen.unwrap_or_else(|| config.mock.listen.clone());
            let server = MockServer::bind(&listen, config.credentials.clone()).await?;

            println!("Mock Revue API at {}", server.base_url()?);
            println!(
                "Accepts {} / {}. Press Ctrl+C to stop.",
                config.credentials.email,
                mask(&config.credentials.password)
            );

            server
                .serve(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
        }

        Commands::Config => {
            match Config::path() {
                Some(path) if path.exists() => println!("Config file: {}", path.display()),
                Some(path) => println!("Config file: {} (not present, using defaults)", path.display()),
                None => println!("Config file: (no config directory on this platform)"),
            }
            println!();
            println!("[api]");
            println!("base_url = {:?}", config.api.base_url);
            println!("[credentials]");
            println!("email = {:?}", config.credentials.email);
            println!("password = {:?}", mask(&config.credentials.password));
            println!("[http]");
            println!("timeout_secs = {}", config.http.timeout_secs);
            println!("[scenario]");
            println!("reauthenticate = {}", config.scenario.reauthenticate);
            println!("[mock]");
            println!("listen = {:?}", config.mock.listen);
            Ok(())
        }
    }
}

fn load_suite_or_builtin(path: Option<&Path>) -> Result<ScenarioSuite> {
    match path {
        Some(path) => scenario::load_suite(path),
        None => Ok(scenario::builtin_suite()),
    }
}

fn print_plan(suite: &ScenarioSuite, plan: &Plan) {
    println!("{} {}", "Plan:".blue().bold(), suite.name.white().bold());

    for (i, step) in plan.steps().iter().enumerate() {
        let deps = step.action.dependencies();
        println!(
            "  {:>2}. {} [{}]",
            i + 1,
            step.name,
            step.action.label().cyan()
        );
        if let Some(desc) = &step.description {
            println!("      {}", desc.dimmed());
        }
        for fact in &deps.consumes {
            println!("      {} {}", "needs".yellow(), fact);
        }
        let providers = plan.providers_of(i);
        if !providers.is_empty() {
            println!("      {} {}", "after".yellow(), providers.join(", "));
        }
        for fact in &deps.produces {
            println!("      {} {}", "gives".green(), fact);
        }
        for fact in &deps.revokes {
            println!("      {} {}", "drops".red(), fact);
        }
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "*".repeat(secret.chars().count().min(8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("string"), "******");
        assert_eq!(mask("a-very-long-password"), "********");
    }

    #[test]
    fn test_builtin_when_no_path() {
        let suite = load_suite_or_builtin(None).unwrap();
        assert_eq!(suite.steps.len(), 7);
    }
}
