use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

use tali_test::catalog::DEFAULT_TESTS;
use tali_test::{Harness, HarnessConfig, HarnessError, ReportOptions, TestCatalog, TestSelection};

#[derive(Parser, Debug)]
#[command(name = "talitest")]
#[command(about = "Run the Tali Forth 2 test suites on the c65 emulator")]
struct Args {
    #[arg(short, long, num_args = 1.., default_value = "all", help = tests_help())]
    tests: Vec<String>,

    /// Output file for the raw emulator output [default: results.txt]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Make a sound at end of testing
    #[arg(short, long)]
    beep: bool,

    /// Only print errors and summary
    #[arg(short, long)]
    mute: bool,

    /// Suppress the output while the tester is loading
    #[arg(short, long = "suppress-tester", alias = "suppress_tester")]
    suppress_tester: bool,

    /// Harness config file [default: talitest.toml if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the c65 emulator
    #[arg(long)]
    emulator: Option<PathBuf>,

    /// Path to the Tali Forth 2 image
    #[arg(long)]
    image: Option<PathBuf>,

    /// Directory holding tester.fs and the test files
    #[arg(long)]
    tests_dir: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// List the available tests and exit
    #[arg(long)]
    list: bool,
}

fn tests_help() -> String {
    let names: Vec<String> = DEFAULT_TESTS.iter().map(|t| format!("'{}'", t)).collect();
    format!("Available tests: 'all' or one or more of {}", names.join(" "))
}

impl Args {
    fn apply(&self, config: &mut HarnessConfig) {
        if let Some(ref emulator) = self.emulator {
            config.emulator = emulator.clone();
        }
        if let Some(ref image) = self.image {
            config.image = image.clone();
        }
        if let Some(ref dir) = self.tests_dir {
            config.tests_dir = dir.clone();
        }
        if let Some(ref output) = self.output {
            config.results = output.clone();
        }
    }

    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            mute: self.mute,
            suppress_tester: self.suppress_tester,
            beep: self.beep,
            json: self.json,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        match &e {
            HarnessError::InvalidSelection { .. } => {
                eprintln!("{} {}. Aborting.", "ERROR:".red().bold(), e);
            }
            _ => eprintln!("{} {}", "ERROR:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

/// Findings in the output never fail the process; only harness errors do
fn run(args: &Args) -> Result<(), HarnessError> {
    let mut config = HarnessConfig::load_or_default(args.config.as_deref())?;
    args.apply(&mut config);
    let harness = Harness::new(config)?;

    if args.list {
        list_tests(harness.catalog());
        return Ok(());
    }

    let selection = TestSelection::from_args(&args.tests);
    if !args.mute && !args.json {
        println!("{}", "Tali Forth 2 Test Runner".bold().cyan());
        println!("Emulator: {}", harness.config().emulator.display());
        println!("Image:    {}", harness.config().image.display());
    }

    let summary = harness.run(&selection, args.report_options())?;
    tracing::info!(passed = summary.passed, completed = summary.classification.completed, "run finished");
    Ok(())
}

fn list_tests(catalog: &TestCatalog) {
    for id in catalog.ids() {
        println!("{:<10} {}", id, TestCatalog::file_name(id));
    }
    println!("\nTotal: {} tests", catalog.ids().len());
}
