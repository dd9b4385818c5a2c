//! Vouch CLI - run evaluation suites against recorded responses
//!
//! ## Commands
//!
//! - `run`: Evaluate every test case in a suite and print the reports
//! - `validate`: Check a suite file without running it
//!
//! `run` exits with status 1 when any report fails, so it can gate CI.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use vouch_core::report::console;
use vouch_core::{evaluate, EvaluationReport, ReportFormat, SuiteConfig};

#[derive(Parser)]
#[command(name = "vouch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Assertions for non-deterministic text outputs", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every test case in a suite
    Run {
        /// Suite file (YAML, or JSON with a .json extension)
        suite: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,

        /// Write reports to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only run test cases with this name (repeatable)
        #[arg(short, long = "test")]
        tests: Vec<String>,
    },

    /// Validate a suite file without running it
    Validate {
        /// Suite file
        suite: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Console,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Console => ReportFormat::Console,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_suite(path: &Path) -> Result<SuiteConfig> {
    SuiteConfig::from_file(path).with_context(|| format!("Failed to load suite {}", path.display()))
}

async fn run(
    suite_path: PathBuf,
    format: OutputFormat,
    output: Option<PathBuf>,
    only: Vec<String>,
) -> Result<bool> {
    let suite = load_suite(&suite_path)?;

    for name in &only {
        if !suite.tests.iter().any(|t| &t.name == name) {
            bail!("No test case named '{}' in suite '{}'", name, suite.name);
        }
    }

    let mut reports: Vec<EvaluationReport> = Vec::new();
    for test in &suite.tests {
        if !only.is_empty() && !only.contains(&test.name) {
            continue;
        }

        let response = suite
            .response_for(test)
            .with_context(|| format!("Failed to load response for '{}'", test.name))?;
        let config = test
            .to_config()
            .with_context(|| format!("Failed to build evaluators for '{}'", test.name))?;

        debug!(test = %test.name, evaluators = config.evaluators.len(), "running test case");
        reports.push(evaluate(&response, &config).await);
    }

    let rendered = render(&reports, format)?;
    match output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "reports written");
        }
        None => print!("{}", rendered),
    }

    Ok(reports.iter().all(|r| r.overall_pass))
}

fn render(reports: &[EvaluationReport], format: OutputFormat) -> Result<String> {
    if let [report] = reports {
        let mut out = ReportFormat::from(format).render(report)?;
        if !out.ends_with('\n') {
            out.push('\n');
        }
        return Ok(out);
    }

    match format {
        OutputFormat::Console => {
            let tables: Vec<String> = reports.iter().map(console::render).collect();
            Ok(tables.join("\n"))
        }
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(reports)?;
            out.push('\n');
            Ok(out)
        }
    }
}

fn validate(suite_path: PathBuf) -> Result<()> {
    let suite = load_suite(&suite_path)?;

    for test in &suite.tests {
        test.to_config()
            .with_context(|| format!("Failed to build evaluators for '{}'", test.name))?;
    }

    println!(
        "Suite '{}' is valid ({} test case{})",
        suite.name,
        suite.tests.len(),
        if suite.tests.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Run {
            suite,
            format,
            output,
            tests,
        } => run(suite, format, output, tests).await,
        Commands::Validate { suite } => validate(suite).map(|()| true),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
