//! Result persistence and summary output

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::error::{HarnessError, HarnessResult};
use crate::runner::ExecutionResult;

/// Summary of one harness run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Tests requested, in run order
    pub tests: Vec<String>,
    /// Findings from the captured output
    #[serde(flatten)]
    pub classification: Classification,
    /// No undefined words and no failures
    pub passed: bool,
    /// Where the raw output was written
    pub results: PathBuf,
    /// Emulator exit code
    pub exit_status: Option<i32>,
    /// Round trip time in milliseconds
    pub duration_ms: u64,
    /// When the run finished
    pub timestamp: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(
        tests: Vec<String>,
        execution: &ExecutionResult,
        classification: Classification,
        results: impl AsRef<Path>,
    ) -> Self {
        Self {
            tests,
            passed: classification.passed(),
            classification,
            results: results.as_ref().to_path_buf(),
            exit_status: execution.status,
            duration_ms: execution.duration.as_millis() as u64,
            timestamp: Utc::now(),
        }
    }

    /// Write the human readable summary
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", "=".repeat(80))?;
        writeln!(out, "Summary for: {}", self.tests.join(" "))?;

        if self.classification.completed {
            writeln!(out, "Tali Forth 2 ran all tests requested")?;
        } else {
            writeln!(
                out,
                "{}\n",
                "Tali Forth 2 crashed before all tests completed".red().bold()
            )?;
        }

        for line in &self.classification.undefined {
            writeln!(out, "{}", line.trim().yellow())?;
        }
        for line in &self.classification.failures {
            writeln!(out, "{}", line.trim().red())?;
        }

        if self.passed {
            writeln!(out, "{}", "All available tests passed".green().bold())?;
        }
        Ok(())
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// How results are presented
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Only print errors and the summary
    pub mute: bool,
    /// Leave the tester's load output out of the echoed transcript
    pub suppress_tester: bool,
    /// Ring the terminal bell when done
    pub beep: bool,
    /// Print the summary as JSON instead of text
    pub json: bool,
}

/// Writes the results file and the console report
#[derive(Debug, Clone)]
pub struct ResultReporter {
    results: PathBuf,
    options: ReportOptions,
}

impl ResultReporter {
    pub fn new(results: impl AsRef<Path>, options: ReportOptions) -> Self {
        Self {
            results: results.as_ref().to_path_buf(),
            options,
        }
    }

    /// Overwrite the results file with the raw captured output
    pub fn persist(&self, execution: &ExecutionResult) -> HarnessResult<()> {
        std::fs::write(&self.results, execution.output.as_bytes()).map_err(|source| {
            HarnessError::ResultsWrite {
                path: self.results.clone(),
                source,
            }
        })?;
        tracing::debug!(path = %self.results.display(), bytes = execution.output.len(), "results written");
        Ok(())
    }

    /// Persist the output, then report on stdout
    pub fn report(
        &self,
        tests: Vec<String>,
        execution: &ExecutionResult,
        classification: Classification,
    ) -> HarnessResult<RunSummary> {
        self.persist(execution)?;

        if !classification.completed {
            tracing::warn!("completion sentinel missing from emulator output");
        }

        let summary = RunSummary::new(tests, execution, classification, &self.results);
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = self.write_report(&mut out, execution, &summary) {
            tracing::warn!("failed to print report: {}", e);
        }
        Ok(summary)
    }

    /// Console output for a finished run
    pub fn write_report<W: Write>(
        &self,
        out: &mut W,
        execution: &ExecutionResult,
        summary: &RunSummary,
    ) -> io::Result<()> {
        if self.options.json {
            let json = summary.to_json().map_err(io::Error::other)?;
            writeln!(out, "{}", json)?;
            return Ok(());
        }

        if !self.options.mute {
            out.write_all(execution.transcript(self.options.suppress_tester).as_bytes())?;
        }
        summary.write_text(out)?;

        if self.options.beep {
            writeln!(out, "\x07")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn execution(output: &str) -> ExecutionResult {
        ExecutionResult {
            output: output.to_string(),
            status: Some(0),
            duration: Duration::from_millis(1500),
        }
    }

    fn render(reporter: &ResultReporter, output: &str, classification: Classification) -> String {
        colored::control::set_override(false);
        let exec = execution(output);
        let summary = RunSummary::new(vec!["core_a".to_string()], &exec, classification, "r.txt");
        let mut buf = Vec::new();
        reporter.write_report(&mut buf, &exec, &summary).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn muted() -> ReportOptions {
        ReportOptions {
            mute: true,
            ..ReportOptions::default()
        }
    }

    #[test]
    fn test_clean_run_passes() {
        let reporter = ResultReporter::new("r.txt", muted());
        let text = render(
            &reporter,
            "ok\nbye c65:\n",
            Classification {
                completed: true,
                ..Classification::default()
            },
        );

        assert!(text.contains("Summary for: core_a"));
        assert!(text.contains("Tali Forth 2 ran all tests requested"));
        assert!(text.contains("All available tests passed"));
        assert!(!text.contains("ok\nbye"));
    }

    #[test]
    fn test_incomplete_clean_run() {
        let reporter = ResultReporter::new("r.txt", muted());
        let text = render(&reporter, "ok\n", Classification::default());

        assert!(text.contains("crashed before all tests completed"));
        assert!(text.contains("All available tests passed"));
    }

    #[test]
    fn test_failures_listed_trimmed_and_no_verdict() {
        let reporter = ResultReporter::new("r.txt", muted());
        let text = render(
            &reporter,
            "",
            Classification {
                completed: true,
                undefined: vec!["  frob undefined  ".to_string()],
                failures: vec!["\tINCORRECT RESULT: x ".to_string()],
            },
        );

        assert!(text.contains("\nfrob undefined\n"));
        assert!(text.contains("\nINCORRECT RESULT: x\n"));
        assert!(!text.contains("All available tests passed"));
    }

    #[test]
    fn test_transcript_echo_and_beep() {
        let reporter = ResultReporter::new(
            "r.txt",
            ReportOptions {
                suppress_tester: true,
                beep: true,
                ..ReportOptions::default()
            },
        );
        let text = render(
            &reporter,
            "tester noise\n ( Running test 'core_a' from file 'core_a.fs' ) ok\n",
            Classification::default(),
        );

        assert!(text.starts_with(" ( Running test 'core_a'"));
        assert!(!text.contains("tester noise"));
        assert!(text.ends_with("\x07\n"));
    }

    #[test]
    fn test_json_summary() {
        let reporter = ResultReporter::new(
            "r.txt",
            ReportOptions {
                json: true,
                ..ReportOptions::default()
            },
        );
        let text = render(
            &reporter,
            "",
            Classification {
                completed: true,
                undefined: vec![],
                failures: vec!["Stack underflow".to_string()],
            },
        );

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["tests"], serde_json::json!(["core_a"]));
        assert_eq!(value["completed"], true);
        assert_eq!(value["passed"], false);
        assert_eq!(value["failures"], serde_json::json!(["Stack underflow"]));
        assert_eq!(value["duration_ms"], 1500);
    }

    #[test]
    fn test_persist_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.txt");
        std::fs::write(&path, "old contents that are longer").unwrap();

        let reporter = ResultReporter::new(&path, ReportOptions::default());
        reporter.persist(&execution("new")).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_persist_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = ResultReporter::new(dir.path().join("no/such/dir/r.txt"), muted());
        assert!(matches!(
            reporter.persist(&execution("x")),
            Err(HarnessError::ResultsWrite { .. })
        ));
    }
}
