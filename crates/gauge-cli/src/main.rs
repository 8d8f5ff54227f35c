use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod sandbox;
mod suite;

use commands::run::ProbeKind;

/// Weighted compatibility scoring and benchmarking harness.
///
/// Runs a weighted suite of functional tests, micro-benchmarks, stress
/// passes and leak checks against a subject under test, then rates the
/// result on a five-tier compatibility scale.
///
/// EXAMPLES:
///     gauge run                          Run the built-in suite
///     gauge run --filter create          Run only matching tests
///     gauge run --json > report.json     Machine-readable report
///     gauge list                         Show tests and weights
///     gauge tiers                        Show the rating bands
///
/// ENVIRONMENT VARIABLES:
///     GAUGE_LOG         Log filter for stderr output (default: warn)
///     GAUGE_JSON        Set to '1' for JSON output by default
///     GAUGE_NO_COLOR    Set to disable colored output
///     NO_COLOR          Set to disable colored output
///     GAUGE_ITERATIONS, GAUGE_SAMPLES, GAUGE_SAMPLE_INTERVAL_SECS,
///     GAUGE_STRESS_BUDGET_SECS, GAUGE_LEAK_TOLERANCE, GAUGE_FILTER
///                       Override the matching gauge.toml settings
#[derive(Parser)]
#[command(name = "gauge")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in suite and print the report
    ///
    /// Settings come from gauge.toml (searched upwards from the current
    /// directory), then GAUGE_* variables, then these flags.
    ///
    /// EXAMPLES:
    ///     gauge run --iterations 100 --samples 2 --interval 0.1
    ///     gauge run --config ci/gauge.toml --json
    ///     gauge run --probe process
    #[command(visible_alias = "r")]
    Run {
        /// Path to a gauge.toml to use instead of searching
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
        /// Only run tests whose name contains this pattern
        #[arg(long, short = 'f')]
        filter: Option<String>,
        /// Iterations per benchmark (default: 1000)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        iterations: Option<u32>,
        /// Memory samples taken after the suite (default: 5)
        #[arg(long)]
        samples: Option<usize>,
        /// Seconds between memory samples (default: 1)
        #[arg(long, value_parser = config::parse_seconds)]
        interval: Option<f64>,
        /// Seconds each stress pass runs for (default: 3)
        #[arg(long, value_parser = config::parse_seconds)]
        stress_budget: Option<f64>,
        /// Allowed growth fraction in leak checks (default: 0.2)
        #[arg(long, value_parser = config::parse_fraction)]
        leak_tolerance: Option<f64>,
        /// Memory probe
        #[arg(long, value_enum, default_value_t = ProbeKind::Objects)]
        probe: ProbeKind,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List registered tests with their weights
    ///
    /// EXAMPLES:
    ///     gauge list
    ///     gauge list --filter bench --json
    #[command(visible_alias = "ls")]
    List {
        /// Path to a gauge.toml to use instead of searching
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
        /// Only list tests whose name contains this pattern
        #[arg(long, short = 'f')]
        filter: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Print the rating bands
    Tiers,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("GAUGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cli_config = config::CliConfig::from_env();

    match cli.command {
        Commands::Run {
            config,
            filter,
            iterations,
            samples,
            interval,
            stress_budget,
            leak_tolerance,
            probe,
            json,
            no_color,
        } => {
            let args = commands::run::RunArgs {
                config,
                filter,
                overrides: config::Overrides {
                    iterations,
                    samples,
                    interval_secs: interval,
                    stress_budget_secs: stress_budget,
                    leak_tolerance,
                },
                probe,
                json: json || cli_config.default_json,
                no_color: no_color || cli_config.no_color,
            };
            commands::run::run(args)?;
        }
        Commands::List {
            config,
            filter,
            json,
            no_color,
        } => {
            let args = commands::list::ListArgs {
                config,
                filter,
                json: json || cli_config.default_json,
                no_color: no_color || cli_config.no_color,
            };
            commands::list::run(args)?;
        }
        Commands::Tiers => commands::tiers::run(),
    }

    Ok(())
}
