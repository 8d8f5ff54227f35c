//! Run command - execute the built-in suite and print the report

use crate::config::{self, Overrides};
use crate::sandbox::Sandbox;
use crate::suite;
use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use gauge_harness::{Harness, ProcessProbe, ReportOptions, RunReport, Tier};
use std::path::PathBuf;

/// Where memory readings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProbeKind {
    /// Live sandbox object count
    #[default]
    Objects,
    /// Resident set size of this process (Linux only; zeros elsewhere)
    Process,
}

/// Arguments for the run command
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Explicit gauge.toml path
    pub config: Option<PathBuf>,
    /// Only run tests whose name contains this pattern
    pub filter: Option<String>,
    pub overrides: Overrides,
    pub probe: ProbeKind,
    /// Output the report as JSON
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
}

/// Run the run command
pub fn run(args: RunArgs) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let project = config::load_project(args.config.as_deref())?;
    let settings = config::resolve_settings(&project, &args.overrides)?;
    let options = ReportOptions {
        drift_warning: settings.drift_warning,
    };

    let mut sandbox = Sandbox::new();
    let harness = Harness::new()
        .with_settings(settings)
        .with_weights(config::resolve_weights(&project));
    let harness = match args.probe {
        ProbeKind::Objects => harness.with_probe(sandbox.probe()),
        ProbeKind::Process => harness.with_probe(ProcessProbe),
    };
    let mut harness = suite::install(harness)?;
    if let Some(pattern) = args.filter.as_deref().or(project.filter()) {
        harness.filter(pattern);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let report = runtime.block_on(harness.execute(&mut sandbox))?;
    let leftover = sandbox.live();
    if leftover > 0 {
        tracing::warn!(leftover, "sandbox objects survived cleanup");
    }

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render(&options));
        println!();
        println!("{}", status_line(&report));
    }

    if args.no_color {
        colored::control::unset_override();
    }

    Ok(())
}

/// One-line colored verdict printed after the text report
fn status_line(report: &RunReport) -> String {
    let verdict = format!(
        "{} of {} weighted points ({:.1}%)",
        report.weighted_score, report.max_weighted_score, report.percentage
    );
    let tier = match report.tier {
        Tier::Full => report.tier.label().green().bold(),
        Tier::Majority => report.tier.label().green(),
        Tier::Partial | Tier::Limited => report.tier.label().yellow(),
        Tier::Poor => report.tier.label().red().bold(),
    };
    format!("{} {}: {}", "Result".bold(), verdict, tier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_with_explicit_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gauge.toml");
        std::fs::write(
            &path,
            "[run]\niterations = 5\nstress_budget_secs = 0.01\nfilter = \"create\"\n\
             [memory]\nsamples = 1\ninterval_secs = 0.0\n",
        )
        .unwrap();

        let args = RunArgs {
            config: Some(path),
            json: true,
            no_color: true,
            ..RunArgs::default()
        };
        assert!(run(args).is_ok());
    }

    #[test]
    fn test_run_with_oversized_interval_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gauge.toml");
        std::fs::write(&path, "[run]\nfilter = \"create_part\"\n").unwrap();

        let args = RunArgs {
            config: Some(path),
            overrides: Overrides {
                interval_secs: Some(1e30),
                ..Overrides::default()
            },
            json: true,
            ..RunArgs::default()
        };
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("sample interval"));
    }

    #[test]
    fn test_run_with_missing_config_fails() {
        let dir = tempdir().unwrap();
        let args = RunArgs {
            config: Some(dir.path().join("absent.toml")),
            ..RunArgs::default()
        };
        assert!(run(args).is_err());
    }
}
