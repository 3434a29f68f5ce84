//! One complete harness run: select, assemble, execute, classify, report

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::assembler::{DirectorySource, ScriptAssembler, load_tester};
use crate::catalog::{TestCatalog, TestSelection};
use crate::classify::OutputClassifier;
use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::report::{ReportOptions, ResultReporter, RunSummary};
use crate::runner::ProcessRunner;

/// Test harness bound to one configuration
pub struct Harness {
    config: HarnessConfig,
    catalog: TestCatalog,
}

impl Harness {
    /// Validate the configured catalog and build a harness
    pub fn new(config: HarnessConfig) -> HarnessResult<Self> {
        let catalog = config.catalog()?;
        Ok(Self { config, catalog })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TestCatalog {
        &self.catalog
    }

    /// Run the selected tests and report on them.
    ///
    /// Structural problems (unknown test, unreadable file, emulator missing)
    /// return an error before any results file is written. Failing tests are
    /// not errors; they are in the returned summary.
    pub fn run(&self, selection: &TestSelection, options: ReportOptions) -> HarnessResult<RunSummary> {
        let tests = self.catalog.resolve(selection)?;
        tracing::info!(tests = %tests.join(" "), "running tests");

        let preamble = load_tester(&self.config.tester_path())?;
        let assembler = ScriptAssembler::new(preamble, DirectorySource::new(&self.config.tests_dir));
        let script = assembler.assemble(&tests)?;

        let runner = ProcessRunner::from_config(&self.config);
        let spinner = (!options.mute && !options.json).then(|| waiting_spinner(&tests));
        let execution = runner.run(&script);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        let execution = execution?;

        let classification =
            OutputClassifier::new(self.config.signatures.clone()).classify(&execution.output);
        tracing::debug!(
            completed = classification.completed,
            undefined = classification.undefined.len(),
            failures = classification.failures.len(),
            "classified output"
        );

        ResultReporter::new(&self.config.results, options).report(tests, &execution, classification)
    }
}

fn waiting_spinner(tests: &[String]) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Running {} test file(s)", tests.len()));
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
