//! List command - show the built-in suite without running it

use crate::config;
use crate::suite;
use anyhow::Result;
use colored::*;
use gauge_harness::Harness;
use std::path::PathBuf;

/// Arguments for the list command
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub config: Option<PathBuf>,
    pub filter: Option<String>,
    pub json: bool,
    pub no_color: bool,
}

/// One registered test as listed
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub weight: u32,
    pub critical: bool,
}

/// Registered tests in execution order, with their effective weights
pub fn entries(config: Option<PathBuf>, filter: Option<&str>) -> Result<Vec<Entry>> {
    let project = config::load_project(config.as_deref())?;
    let weights = config::resolve_weights(&project);
    let mut harness = suite::install(Harness::new().with_weights(weights))?;
    if let Some(pattern) = filter.or(project.filter()) {
        harness.filter(pattern);
    }

    Ok(harness
        .registry()
        .iter()
        .map(|case| Entry {
            name: case.name().to_string(),
            weight: case.resolved_weight(harness.weights()),
            critical: case.is_critical(),
        })
        .collect())
}

/// Run the list command
pub fn run(args: ListArgs) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let entries = entries(args.config, args.filter.as_deref())?;

    if args.json {
        let tests: Vec<_> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "name": e.name,
                    "weight": e.weight,
                    "critical": e.critical,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "tests": tests,
                "total_weight": entries.iter().map(|e| u64::from(e.weight)).sum::<u64>(),
            })
        );
    } else if entries.is_empty() {
        println!("{}", "No tests match.".yellow());
    } else {
        for entry in &entries {
            let marker = if entry.critical {
                "critical".red().to_string()
            } else {
                String::new()
            };
            println!("{:<32}  {:>4}  {}", entry.name, entry.weight, marker);
        }
        println!();
        println!(
            "{} test{}",
            entries.len().to_string().bold(),
            if entries.len() == 1 { "" } else { "s" }
        );
    }

    if args.no_color {
        colored::control::unset_override();
    }

    Ok(())
}
